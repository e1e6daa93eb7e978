use core::time::Duration;

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use thingview::{
    GatewayConfig, HttpClient, Thing, ThingsView, Transport as _,
    push::PushChannel,
    sync::Reconciliation,
    view::UiEvent,
};
use thingview_common::display_value;
use tokio::sync::mpsc::unbounded_channel;

#[derive(Parser)]
struct Args {
    /// Gateway base URL
    #[arg(long, env = "THINGVIEW_GATEWAY", default_value = "http://localhost:8080")]
    gateway: String,

    /// Bearer credential for the gateway
    #[arg(long, env = "THINGVIEW_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a thing's properties and actions
    Show { thing: String },
    /// Write a property
    Set { thing: String, property: String, value: String },
    /// Invoke an action, with inputs as `field=value`
    Invoke {
        thing: String,
        action: String,
        inputs: Vec<String>,
    },
    /// Follow a thing's pushed updates until the gateway hangs up
    Watch { thing: String },
}

/// Accepts either a thing id or its href.
fn thing_href(thing: &str) -> String {
    if thing.starts_with('/') || thing.contains("://") {
        thing.to_owned()
    } else {
        format!("/things/{thing}")
    }
}

fn print_thing(thing: &Thing) {
    println!("{} ({})", thing.description().display_name(), thing.id());

    for (name, property) in &thing.description().properties {
        let value = match thing.value(name) {
            Some(value) => display_value(value),
            None => "?".to_owned(),
        };
        let unit = property.unit.as_deref().unwrap_or_default();
        let access = if property.read_only { " (read-only)" } else { "" };

        println!("  {}: {value}{unit}{access}", property.label_or(name));
    }

    for (name, action) in &thing.description().actions {
        println!("  action {name}: {}", action.label_or(name));
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    thingview::log::init();

    let args = Args::parse();

    let mut config = GatewayConfig::new(&args.gateway)
        .context("invalid gateway url")?
        .with_timeout(Duration::from_secs(args.timeout));
    if let Some(token) = &args.token {
        config = config.with_token(token);
    }

    let client = HttpClient::new(config).context("failed to build http client")?;

    match args.command {
        Command::Show { thing } => {
            let thing = Thing::load(&client, &thing_href(&thing))
                .await
                .context("failed to load thing")?;
            print_thing(&thing);
        }
        Command::Set { thing, property, value } => {
            let mut thing = Thing::load(&client, &thing_href(&thing))
                .await
                .context("failed to load thing")?;

            let Some(write) = thing.set_input(&property, &value) else {
                bail!("cannot set {property} to {value:?}");
            };

            let result = client
                .put_property(&write.href, &write.property, write.value.clone())
                .await;
            if thing.complete_write(&write, result) != Some(Reconciliation::Applied) {
                bail!("gateway rejected the write");
            }

            let value = thing.value(&property).map(display_value).unwrap_or_default();
            println!("{property} = {value}");
        }
        Command::Invoke { thing, action, inputs } => {
            let mut thing = Thing::load(&client, &thing_href(&thing))
                .await
                .context("failed to load thing")?;

            let form = thing
                .form_mut(&action)
                .with_context(|| format!("no action named {action}"))?;
            for input in &inputs {
                let (field, raw) = input.split_once('=').unwrap_or(("", input.as_str()));
                form.set_field(field, raw)
                    .with_context(|| format!("invalid input {input:?}"))?;
            }

            let request = thing.invoke(&action)?;
            client
                .post_action(&request.href, request.body)
                .await
                .context("failed to invoke action")?;

            println!("invoked {action}");
        }
        Command::Watch { thing } => {
            let href = thing_href(&thing);
            let config = client.config().clone();

            let mut view = ThingsView::new(client);
            let id = view.load(&href).await.context("failed to load thing")?.id().clone();

            let channel = PushChannel::connect(&config, id.clone(), &href)
                .await
                .context("failed to open push channel")?;

            let (ui_tx, ui_rx) = unbounded_channel::<UiEvent>();
            let (push_tx, push_rx) = unbounded_channel();
            drop(ui_tx);

            let mut last = String::new();
            let render = |view: &ThingsView<HttpClient>| {
                let Some(thing) = view.thing(&id) else {
                    return;
                };

                let detail = thing.detail_view();
                if detail != last {
                    print_thing(thing);
                    last = detail;
                }
            };

            let (forwarded, ()) =
                tokio::join!(channel.forward(push_tx), view.run(ui_rx, push_rx, render));
            forwarded.context("push channel failed")?;
        }
    }

    Ok(())
}
