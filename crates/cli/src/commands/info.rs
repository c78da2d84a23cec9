//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::ForwarderConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    client: ClientInfo,
    labels: LabelInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    dynamic_routing: Option<DynamicRoutingInfo>,
}

#[derive(Serialize)]
struct ClientInfo {
    url: String,
    sink: String,
    queue_name: String,
    queue_capacity: usize,
    remove_tenant_id: bool,
}

#[derive(Serialize)]
struct LabelInfo {
    label_keys: Vec<String>,
    remove_keys: Vec<String>,
    label_map: bool,
    auto_kubernetes_labels: bool,
    line_format: String,
}

#[derive(Serialize)]
struct DynamicRoutingInfo {
    host_regex: String,
    url_template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    dynamic_tenant: Option<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&config);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(config: &ForwarderConfig) -> ConfigInfo {
    let plugin = &config.plugin;

    let dynamic_routing = config.has_dynamic_hosts().then(|| DynamicRoutingInfo {
        host_regex: plugin.dynamic_host_regex.clone(),
        url_template: format!(
            "{}<cluster>{}",
            config.controller.dynamic_host_prefix, config.controller.dynamic_host_suffix
        ),
        dynamic_tenant: plugin
            .dynamic_tenant
            .is_enabled()
            .then(|| plugin.dynamic_tenant.tenant.clone()),
    });

    ConfigInfo {
        version: format!("{:?}", config.version),
        client: ClientInfo {
            url: config.client.url.clone(),
            sink: format!("{:?}", config.client.sink),
            queue_name: config.client.queue_name.clone(),
            queue_capacity: config.client.queue_capacity,
            remove_tenant_id: plugin
                .dynamic_tenant
                .remove_tenant_id_when_sending_to_default_url,
        },
        labels: LabelInfo {
            label_keys: plugin.label_keys.clone(),
            remove_keys: plugin.remove_keys.clone(),
            label_map: plugin.label_map.is_some(),
            auto_kubernetes_labels: plugin.auto_kubernetes_labels,
            line_format: format!("{:?}", plugin.line_format),
        },
        dynamic_routing,
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  Log Forwarder Configuration                 ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📤 Default Client");
    println!("   ├─ Version: {}", info.version);
    println!("   ├─ URL: {}", info.client.url);
    println!("   ├─ Sink: {}", info.client.sink);
    println!(
        "   ├─ Queue: {} (capacity {})",
        info.client.queue_name, info.client.queue_capacity
    );
    println!("   └─ Strip tenant labels: {}", info.client.remove_tenant_id);

    println!("\n🏷️  Labels");
    println!("   ├─ Label keys: {:?}", info.labels.label_keys);
    println!("   ├─ Remove keys: {:?}", info.labels.remove_keys);
    println!("   ├─ Label map: {}", info.labels.label_map);
    println!(
        "   ├─ Auto kubernetes labels: {}",
        info.labels.auto_kubernetes_labels
    );
    println!("   └─ Line format: {}", info.labels.line_format);

    match &info.dynamic_routing {
        Some(routing) => {
            println!("\n🔀 Dynamic Routing");
            println!("   ├─ Host pattern: {}", routing.host_regex);
            println!("   ├─ Cluster URL: {}", routing.url_template);
            match &routing.dynamic_tenant {
                Some(tenant) => println!("   └─ Dynamic tenant: {}", tenant),
                None => println!("   └─ Dynamic tenant: disabled"),
            }
        }
        None => println!("\n🔀 Dynamic Routing: disabled"),
    }

    println!();
}
