//! `featureinfo query` - query the configured layers at a pixel.

use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use featureinfo::dispatch::{
    DispatchOptions, FeatureInfoDispatcher, FeatureInfoEvent, FeatureInfoResult,
};
use featureinfo::http::AsyncReqwestClient;
use featureinfo::query::{ClickPosition, QueryTarget};
use tracing::info;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the query command.
#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Pixel column of the click
    #[arg(long)]
    pub x: f64,

    /// Pixel row of the click
    #[arg(long)]
    pub y: f64,

    /// Layer id to query (repeatable); defaults to all visible, queryable layers
    #[arg(long = "target", value_name = "ID")]
    pub targets: Vec<String>,

    /// Send one request per layer
    #[arg(long)]
    pub per_target: bool,

    /// Combine all layers into a single request to the first layer's endpoint
    #[arg(long)]
    pub no_batch: bool,

    /// Maximum features per request
    #[arg(long, value_name = "N")]
    pub feature_count: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl QueryArgs {
    /// Config defaults with command-line flags applied on top.
    fn dispatch_options(&self, defaults: DispatchOptions) -> DispatchOptions {
        let mut options = defaults;
        if self.per_target {
            options = options.with_per_target_requests(true);
        }
        if self.no_batch {
            options = options.with_batch_by_endpoint(false);
        }
        if let Some(count) = self.feature_count {
            options = options.with_feature_count(count);
        }
        options
    }
}

/// Run the query command.
pub fn run(args: QueryArgs, runner: &CliRunner) -> Result<(), CliError> {
    runner.log_startup("query");
    let config = runner.config();

    let catalog = config.catalog();
    let targets: Vec<Arc<QueryTarget>> = if args.targets.is_empty() {
        catalog.queryable()
    } else {
        catalog.select(args.targets.as_slice())?
    };

    let mut dispatcher_config = config.dispatcher_config();
    if let Some(secs) = args.timeout {
        dispatcher_config = dispatcher_config.with_timeout(Duration::from_secs(secs));
    }
    let options = args.dispatch_options(config.dispatch_options());
    let view = config.map_view();
    let click = ClickPosition::new(args.x, args.y);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let client = AsyncReqwestClient::with_timeout(dispatcher_config.timeout)?;

    let event = runtime.block_on(async {
        let (mut dispatcher, mut events) =
            FeatureInfoDispatcher::start(client, dispatcher_config, view);

        let ticket = dispatcher.dispatch(click, &targets, &options);
        info!(ticket = ?ticket, "Query dispatched");

        events
            .recv()
            .await
            .ok_or_else(|| CliError::Query("dispatcher stopped before answering".to_string()))
    })?;

    match event {
        FeatureInfoEvent::NoTargets { .. } => {
            println!("No queryable layers at {}.", click);
        }
        FeatureInfoEvent::Complete(result) => {
            print!("{}", format_result(&result));
        }
    }

    Ok(())
}

/// Human-readable listing of one query result.
pub fn format_result(result: &FeatureInfoResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} feature(s) at {} from {} request(s)",
        result.feature_count(),
        result.click,
        result.groups.len()
    );

    for (n, group) in result.groups.iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "[{}] {} ({})",
            n + 1,
            group.endpoint,
            group.target_ids.join(", ")
        );

        if let Some(failure) = &group.failure {
            let _ = writeln!(out, "  failed: {}", failure);
            continue;
        }

        for item in &group.features {
            let label = match (&item.feature.feature_type, &item.feature.fid) {
                (_, Some(fid)) => fid.clone(),
                (Some(kind), None) => kind.clone(),
                (None, None) => "feature".to_string(),
            };
            let _ = writeln!(out, "  {}: {}", item.target.id, label);
            for (name, value) in &item.feature.attributes {
                let _ = writeln!(out, "    {} = {}", name, value);
            }
        }

        if let Some(text) = &group.text {
            for line in text.lines().filter(|l| !l.trim().is_empty()) {
                let _ = writeln!(out, "  | {}", line);
            }
        } else if group.features.is_empty() {
            let _ = writeln!(out, "  no features");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use featureinfo::dispatch::{AttributedFeature, GroupFailure, GroupResult};
    use featureinfo::format::ParsedFeature;
    use featureinfo::http::HttpError;

    fn group(index: usize, endpoint: &str) -> GroupResult {
        GroupResult {
            index,
            endpoint: endpoint.to_string(),
            target_ids: vec!["roads".to_string()],
            features: Vec::new(),
            text: None,
            failure: None,
        }
    }

    #[test]
    fn test_format_result() {
        let target = Arc::new(QueryTarget::new("roads", "http://a/wms").with_layers(["roads"]));
        let mut ok = group(0, "http://a/wms");
        ok.features.push(AttributedFeature {
            target,
            feature: ParsedFeature::new()
                .with_fid("roads.12")
                .with_attribute("name", "A1"),
        });
        let mut failed = group(1, "http://b/wms");
        failed.failure = Some(GroupFailure::Transport(HttpError::Status {
            url: "http://b/wms".to_string(),
            status: 503,
        }));
        let mut html = group(2, "http://c/wms");
        html.text = Some("<p>Road A1</p>\n\n".to_string());

        let result = FeatureInfoResult {
            cycle: 1,
            click: ClickPosition::new(3.0, 4.0),
            groups: vec![ok, failed, html],
        };
        let out = format_result(&result);

        assert!(out.starts_with("1 feature(s)"));
        assert!(out.contains("[1] http://a/wms (roads)\n  roads: roads.12\n    name = A1\n"));
        assert!(out.contains("[2] http://b/wms (roads)\n  failed: transport:"));
        assert!(out.contains("  | <p>Road A1</p>\n"));
        assert!(!out.contains("no features"));
    }

    #[test]
    fn test_flags_override_config_defaults() {
        let args = QueryArgs {
            x: 0.0,
            y: 0.0,
            targets: Vec::new(),
            per_target: false,
            no_batch: true,
            feature_count: Some(4),
            timeout: None,
        };
        let options = args.dispatch_options(DispatchOptions::default());
        assert!(!options.batch_by_endpoint);
        assert!(!options.per_target_requests);
        assert_eq!(options.feature_count, Some(4));

        let defaults = DispatchOptions::default().with_per_target_requests(true);
        assert!(args.dispatch_options(defaults).per_target_requests);
    }
}
