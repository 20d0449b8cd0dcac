//! # octane-ctl
//!
//! Command-line access to a running engine.
//!
//! ```text
//! octane-ctl info
//! octane-ctl --url http://render-box:51022 tree
//! octane-ctl load scenes/hero.ocs
//! octane-ctl render --save beauty.png --image-type png16
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use octane_client::{ClientConfig, ItemProxy, OctaneClient};
use octane_core::{CallbackEvent, ImageType, NodeType};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "octane-ctl", version, about = "Inspect and drive an Octane render engine")]
struct Cli {
    /// Engine URL, overrides the config file and OCTANE_GRPC_URL
    #[arg(long, global = true)]
    url: Option<String>,

    /// Path to client.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print engine version information
    Info,

    /// Print the scene graph
    Tree,

    /// Load a project file
    Load { path: PathBuf },

    /// Save the project under a new path
    SaveAs { path: PathBuf },

    /// Render the current render target until it finishes
    Render {
        /// Write the result here when done
        #[arg(long)]
        save: Option<PathBuf>,

        #[arg(long, default_value = "png8")]
        image_type: ImageType,

        /// Give up after this many seconds
        #[arg(long, default_value_t = 300)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::load(cli.config).context("failed to load client config")?;
    if let Some(url) = cli.url {
        config.connection.url = url;
    }
    // Only `render` needs callbacks
    config.callbacks.enabled = matches!(cli.command, Command::Render { .. });

    let client = OctaneClient::connect(config)
        .await
        .context("failed to connect to the engine")?;

    match cli.command {
        Command::Info => print_info(&client).await,
        Command::Tree => print_tree(&client).await,
        Command::Load { path } => {
            if !client.project_manager().load_project(&path).await? {
                bail!("engine could not load {}", path.display());
            }
            println!("Loaded {}", path.display());
            Ok(())
        }
        Command::SaveAs { path } => {
            if !client.project_manager().save_project_as(&path).await? {
                bail!("engine could not save {}", path.display());
            }
            println!("Saved {}", path.display());
            Ok(())
        }
        Command::Render {
            save,
            image_type,
            timeout_secs,
        } => render(&client, save, image_type, Duration::from_secs(timeout_secs)).await,
    }
}

async fn print_info(client: &OctaneClient) -> anyhow::Result<()> {
    let info = client.info().get().await?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    if !info.is_compatible() {
        eprintln!(
            "warning: engine API {} differs from SDK API {}",
            info.version,
            octane_core::API_VERSION
        );
    }
    Ok(())
}

async fn print_tree(client: &OctaneClient) -> anyhow::Result<()> {
    let root = client.project_manager().root_node_graph().await?;
    println!("{} [{}]", root.name().await?, root.object());

    // Depth-first, children pushed in reverse so they print in order
    let mut stack: Vec<(ItemProxy, usize)> = root
        .owned_items()
        .await?
        .into_iter()
        .rev()
        .map(|item| (item, 1))
        .collect();

    while let Some((item, depth)) = stack.pop() {
        let indent = "  ".repeat(depth);
        let name = item.name().await?;
        if item.is_graph() {
            let graph = item.as_graph()?;
            println!("{}{} [{:?} graph, {}]", indent, name, graph.graph_type().await?, item.object());
            let children = graph.owned_items().await?;
            stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
        } else {
            let node_type: NodeType = item.as_node()?.node_type().await?;
            println!("{}{} [{}, {}]", indent, name, node_type, item.object());
        }
    }
    Ok(())
}

async fn render(
    client: &OctaneClient,
    save: Option<PathBuf>,
    image_type: ImageType,
    timeout: Duration,
) -> anyhow::Result<()> {
    let render = client.render_engine();
    if render.render_target_node().await?.is_none() {
        let root = client.project_manager().root_node_graph().await?;
        let Some(target) = root.find_nodes(NodeType::RenderTarget, true).await?.into_iter().next() else {
            bail!("the scene has no render target node");
        };
        debug!(target = %target.object(), "Selecting first render target");
        render.set_render_target_node(Some(&target)).await?;
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let failures = tx.clone();
    render
        .set_on_new_image_callback(move |event| {
            if let CallbackEvent::NewImage(stats) = event {
                if stats.is_complete() {
                    let _ = tx.send(Ok(stats.clone()));
                }
            }
        })
        .await?;
    render
        .set_on_render_failure_callback(move |event| {
            if let CallbackEvent::RenderFailure { reason } = event {
                let _ = failures.send(Err(reason.clone()));
            }
        })
        .await?;

    render.restart_rendering().await?;
    info!("Rendering...");

    let outcome = tokio::time::timeout(timeout, rx.recv())
        .await
        .context("render timed out")?
        .context("callback stream closed")?;
    render.clear_on_new_image_callback().await?;
    render.clear_on_render_failure_callback().await?;

    let stats = match outcome {
        Ok(stats) => stats,
        Err(reason) => bail!("render failed: {}", reason),
    };
    println!(
        "Finished {} samples at {}x{} in {:.1}s",
        stats.samples,
        stats.width,
        stats.height,
        stats.elapsed.as_secs_f64()
    );

    if let Some(path) = save {
        if !render.save_image(&path, image_type).await? {
            bail!("engine could not save the image to {}", path.display());
        }
        println!("Saved {}", path.display());
    }
    Ok(())
}
