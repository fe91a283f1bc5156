use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use blacklabel::core::{
    Explorer, ExplorerSettings, LocalFs, RootOrder, WorkspaceFile, WorkspaceFolder,
    WorkspaceFolders, load_settings, render_unicode_tree, snapshot,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrderArg {
    Listing,
    DirsFirst,
}

impl From<OrderArg> for RootOrder {
    fn from(o: OrderArg) -> Self {
        match o {
            OrderArg::Listing => Self::Listing,
            OrderArg::DirsFirst => Self::DirectoriesFirst,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "blacklabel")]
#[command(about = "Show a markdown repository as a tree: drafts flattened, assets attached")]
struct Args {
    /// Workspace roots. Defaults to the folders in the project settings.
    roots: Vec<PathBuf>,

    /// Project directory holding `.blacklabel/workspace.json`
    #[arg(long, default_value = ".")]
    project: PathBuf,

    /// Order of the top-level listing when there is a single root
    #[arg(long, value_enum)]
    order: Option<OrderArg>,

    /// Expand at most this many levels below the top level
    #[arg(long)]
    depth: Option<usize>,

    /// Print the expanded tree as JSON
    #[arg(long)]
    json: bool,

    /// Re-render when files under the roots change
    #[arg(long)]
    watch: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

async fn print_once(explorer: &Explorer, args: &Args) -> anyhow::Result<()> {
    let nodes = snapshot(explorer, args.depth).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&nodes)?);
    } else {
        print!("{}", render_unicode_tree(&nodes, None));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let project = dunce::canonicalize(&args.project)
        .with_context(|| format!("project directory {}", args.project.display()))?;
    let mut settings: ExplorerSettings = load_settings(&project).unwrap_or_default();
    if let Some(order) = args.order {
        settings.root_order = order.into();
    }

    let folders: Arc<dyn WorkspaceFolders> = if args.roots.is_empty() {
        Arc::new(WorkspaceFile {
            project_root: project.clone(),
            settings: settings.clone(),
        })
    } else {
        let mut list = Vec::with_capacity(args.roots.len());
        for root in &args.roots {
            let abs = dunce::canonicalize(root)
                .with_context(|| format!("workspace root {}", root.display()))?;
            list.push(WorkspaceFolder::local(abs));
        }
        Arc::new(list)
    };

    let explorer = Explorer::from_settings(Arc::new(LocalFs), Arc::clone(&folders), &settings);
    print_once(&explorer, &args).await?;

    if args.watch {
        #[cfg(feature = "watch")]
        watch_loop(&explorer, &args, folders.as_ref(), &settings).await?;
        #[cfg(not(feature = "watch"))]
        tracing::warn!("built without the `watch` feature; --watch ignored");
    }

    Ok(())
}

#[cfg(feature = "watch")]
async fn watch_loop(
    explorer: &Explorer,
    args: &Args,
    folders: &dyn WorkspaceFolders,
    settings: &ExplorerSettings,
) -> anyhow::Result<()> {
    use blacklabel::core::{drain_relevant, is_change_relevant, watch_roots};
    use chrono::Local;
    use std::time::Duration;
    use tracing::{error, info};

    let roots: Vec<PathBuf> = folders
        .workspace_folders()
        .into_iter()
        .filter(WorkspaceFolder::is_local)
        .map(|f| f.path)
        .collect();
    let (_watcher, mut rx) = watch_roots(&roots)?;
    let policy = settings.directory_policy;

    while let Some(first) = rx.recv().await {
        // Let bursts (editor saves, git checkouts) settle before re-reading.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let relevant = is_change_relevant(&roots, &first.path, policy);
        let more = drain_relevant(&mut rx, &roots, policy);
        if !(relevant || more) {
            continue;
        }

        info!(at = %Local::now().format("%H:%M:%S"), "refreshing");
        // A failed read keeps the previous output on screen.
        if let Err(err) = print_once(explorer, args).await {
            error!("{err:#}");
        }
    }
    Ok(())
}
