//! User configuration stored in `~/.featureinfo/config.ini`.
//!
//! The file describes the dispatcher defaults, the map view clicks refer to,
//! global vendor parameters and the layers that can be queried:
//!
//! ```ini
//! [dispatch]
//! batch_by_endpoint = true
//! timeout = 30
//!
//! [view]
//! projection = EPSG:3857
//! bbox = 0,6000000,1000000,7000000
//! width = 1024
//! height = 768
//!
//! [target:roads]
//! url = https://maps.example.com/wms
//! layers = roads,motorways
//! vendor.MAP = /srv/roads.map
//! ```

mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ConfigFile, DispatchSettings, LoggingSettings, ViewSettings};
