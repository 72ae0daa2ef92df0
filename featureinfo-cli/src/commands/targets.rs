//! `featureinfo targets` - list the configured layers.

use featureinfo::catalog::LayerCatalog;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the targets command.
pub fn run(runner: &CliRunner) -> Result<(), CliError> {
    runner.log_startup("targets");
    let catalog = runner.config().catalog();

    if catalog.is_empty() {
        println!(
            "No layers configured. Add [target:<id>] sections to {}",
            runner.config_path().display()
        );
        return Ok(());
    }

    print!("{}", format_catalog(&catalog));
    Ok(())
}

/// One line per layer plus an indented detail line.
pub fn format_catalog(catalog: &LayerCatalog) -> String {
    let queryable = catalog.queryable();
    let mut out = format!(
        "{} layer(s), {} queried by default\n",
        catalog.len(),
        queryable.len()
    );

    for target in catalog.iter() {
        let mut flags = Vec::new();
        if !target.visible {
            flags.push("hidden");
        }
        if !target.queryable {
            flags.push("not queryable");
        }
        if target.request_individually {
            flags.push("individual");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };

        out.push_str(&format!("\n{}{}\n", target.id, flags));
        out.push_str(&format!(
            "  {} (WMS {}) layers: {}\n",
            target.url,
            target.version,
            target.layers.join(",")
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use featureinfo::query::QueryTarget;

    #[test]
    fn test_format_catalog() {
        let catalog: LayerCatalog = [
            QueryTarget::new("roads", "http://a/wms").with_layers(["roads", "motorways"]),
            QueryTarget::new("labels", "http://a/wms")
                .with_layers(["labels"])
                .with_queryable(false)
                .with_version("1.3.0"),
        ]
        .into_iter()
        .collect();

        let out = format_catalog(&catalog);
        assert!(out.starts_with("2 layer(s), 1 queried by default\n"));
        assert!(out.contains("\nroads\n  http://a/wms (WMS 1.1.1) layers: roads,motorways\n"));
        assert!(out.contains("\nlabels [not queryable]\n  http://a/wms (WMS 1.3.0)"));
    }
}
