//! Interactive shell-namespace explorer.

use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::Level;
use tracing::subscriber::set_global_default;
use tracing_subscriber::EnvFilter;

use shellscape::{
    Browser, ChangeEvent, ChangeKind, ChangeRouter, FilterSpec, ItemAttributes, KnownFolderIndex,
    MemoryProvider, NamespaceProvider, ResolveError,
};

const DEMO_NAMESPACE: &str = include_str!("demo_namespace.toml");

/// Browse a shell namespace from the terminal.
#[derive(Parser)]
#[command(name = "shellscape", version)]
struct Opts {
    /// Serve the virtual namespace described by a TOML or JSON manifest.
    #[arg(long, value_name = "FILE")]
    manifest: Option<PathBuf>,

    /// Serve the host directory tree rooted at DIR.
    #[cfg(feature = "host")]
    #[arg(long, value_name = "DIR", conflicts_with = "manifest")]
    root: Option<PathBuf>,

    /// More log output (-v: info, -vv: debug, -vvv: trace).
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Less log output.
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    quiet: u8,
}

enum Backend {
    Memory(Rc<MemoryProvider>),
    #[cfg(feature = "host")]
    Host(Rc<shellscape::HostProvider>),
}

impl Backend {
    fn provider(&self) -> Rc<dyn NamespaceProvider> {
        match self {
            Backend::Memory(memory) => memory.clone(),
            #[cfg(feature = "host")]
            Backend::Host(host) => host.clone(),
        }
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let env_filter = EnvFilter::from_default_env().add_directive(level.into());
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact()
        .finish();
    let _ = set_global_default(subscriber);
}

fn main() {
    let opts = Opts::parse();
    init_tracing(opts.verbose.saturating_sub(opts.quiet));
    if let Err(error) = run(opts) {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

fn run(opts: Opts) -> anyhow::Result<()> {
    let backend = open_backend(&opts)?;
    let provider = backend.provider();

    let mut browser = Browser::open_desktop(provider)?;
    let router = printing_router();

    println!("shellscape, type `help` for commands");
    report_location(&browser);

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("{}> ", browser.current());
        io::stdout().flush()?;

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let (command, rest) = split_command(input);
        if matches!(command, "quit" | "exit") {
            break;
        }
        if let Err(error) = dispatch(command, rest, &mut browser, &backend, &router) {
            eprintln!("error: {error:#}");
        }
    }
    Ok(())
}

fn open_backend(opts: &Opts) -> anyhow::Result<Backend> {
    #[cfg(feature = "host")]
    if let Some(root) = &opts.root {
        let host = shellscape::HostProvider::new(root)
            .with_context(|| format!("cannot serve {}", root.display()))?;
        return Ok(Backend::Host(Rc::new(host)));
    }

    let memory = match &opts.manifest {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
            {
                MemoryProvider::from_json_str(&text)?
            } else {
                MemoryProvider::from_toml_str(&text)?
            }
        }
        None => MemoryProvider::from_toml_str(DEMO_NAMESPACE)?,
    };
    Ok(Backend::Memory(Rc::new(memory)))
}

fn dispatch(
    command: &str,
    rest: &str,
    browser: &mut Browser,
    backend: &Backend,
    router: &ChangeRouter,
) -> anyhow::Result<()> {
    match command {
        "help" => print_help(),
        "ls" => list_entries(browser)?,
        "cd" => change_folder(browser, rest)?,
        "up" => {
            browser.up()?;
            report_location(browser);
        }
        "back" => {
            browser.back()?;
            report_location(browser);
        }
        "fwd" => {
            browser.forward()?;
            report_location(browser);
        }
        "pwd" => print_location(browser)?,
        "history" => print_history(browser),
        "places" => print_places(browser)?,
        "filter" => apply_filter(browser, rest)?,
        "pump" => pump_changes(backend, router)?,
        "mkdir" | "touch" | "rm" | "ren" | "mount" | "unmount" => {
            mutate(backend, browser, command, rest)?;
        }
        _ => bail!("unknown command `{command}`, type `help`"),
    }
    Ok(())
}

fn print_help() {
    println!("  ls                      list the current folder");
    println!("  cd <name|uri|path|..>   enter a folder");
    println!("  up                      go to the parent folder");
    println!("  back / fwd              move through navigation history");
    println!("  pwd                     print the current location");
    println!("  history                 show the navigation history");
    println!("  places                  list known folders");
    println!("  filter [spec|off]       set, show or clear the file filter");
    println!("  pump                    deliver pending change notifications");
    println!("  mkdir/touch/rm/ren      edit a manifest namespace");
    println!("  mount/unmount <drive>   attach or detach a drive");
    println!("  quit                    leave");
}

fn list_entries(browser: &Browser) -> anyhow::Result<()> {
    let entries = browser.entries()?;
    for entry in &entries {
        let attributes = entry.attributes()?;
        let marker = if attributes.contains(ItemAttributes::FOLDER) {
            "/"
        } else {
            ""
        };
        let note = if attributes.contains(ItemAttributes::HIDDEN) {
            "  (hidden)"
        } else {
            ""
        };
        println!("  {}{marker}{note}", entry.display_name()?);
    }
    println!("{} item(s)", entries.len());
    Ok(())
}

fn change_folder(browser: &mut Browser, target: &str) -> anyhow::Result<()> {
    if target.is_empty() {
        bail!("usage: cd <name|uri|path|..>");
    }
    if target == ".." {
        browser.up()?;
    } else if target.contains("://") || shellscape::utils::paths::is_absolute(target) {
        browser.navigate_to(target)?;
    } else {
        let child = browser.current().child(target)?;
        browser.navigate(child)?;
    }
    report_location(browser);
    Ok(())
}

fn report_location(browser: &Browser) {
    let current = browser.current();
    match current.to_uri() {
        Ok(uri) => println!("at {uri}"),
        Err(_) => println!("at {current}"),
    }
}

fn print_location(browser: &Browser) -> anyhow::Result<()> {
    let current = browser.current();
    match current.to_uri() {
        Ok(uri) => println!("{uri}"),
        Err(error) => println!("(no uri: {error})"),
    }
    if let Some(path) = current.file_system_path()? {
        println!("{path}");
    }
    Ok(())
}

fn print_history(browser: &Browser) {
    let history = browser.history();
    for item in history.history_back() {
        println!("   {item}");
    }
    if let Some(current) = history.current() {
        println!(" * {current}");
    }
    for item in history.history_forward() {
        println!("   {item}");
    }
}

fn print_places(browser: &Browser) -> anyhow::Result<()> {
    let index = KnownFolderIndex::for_provider(Rc::clone(browser.provider()));
    if index.is_empty() {
        println!("no known folders");
        return Ok(());
    }
    for entry in index.iter() {
        let location = match index.by_name(entry.name()) {
            Ok(item) => match item.file_system_path()? {
                Some(path) => path,
                None => "(virtual)".to_string(),
            },
            Err(error) => format!("(unavailable: {error})"),
        };
        println!("  {:<20} {location}", entry.name());
    }
    Ok(())
}

fn apply_filter(browser: &mut Browser, spec: &str) -> anyhow::Result<()> {
    match spec {
        "" => {
            report_filter(browser);
            return Ok(());
        }
        "off" => {
            browser.clear_filter();
            println!("filter cleared");
            return Ok(());
        }
        _ => {}
    }
    if spec.contains('|') {
        let parsed = FilterSpec::parse(spec, "")?;
        let pattern = parsed
            .items()
            .first()
            .and_then(|item| item.patterns().split(',').next())
            .map(|member| member.trim().to_string())
            .context("filter string carries no patterns")?;
        browser.set_filter(spec, &pattern)?;
    } else {
        browser.select_pattern(spec)?;
    }
    report_filter(browser);
    Ok(())
}

fn report_filter(browser: &Browser) {
    let Some(spec) = browser.filter_spec() else {
        println!("no filter");
        return;
    };
    let selected = browser.selected_filter_index();
    for (position, item) in spec.items().iter().enumerate() {
        let marker = if selected == Some(position) { "*" } else { " " };
        println!(" {marker} {}", item.display_caption());
    }
    if let Some(pattern) = browser.active_pattern() {
        println!("matching {pattern}");
    }
}

fn printing_router() -> ChangeRouter {
    let mut router = ChangeRouter::new();
    for kind in ChangeKind::ALL {
        router.subscribe(*kind, |event| println!("  {}", describe(event)));
    }
    router
}

fn describe(event: &ChangeEvent) -> String {
    match (event.kind, &event.other) {
        (ChangeKind::ItemRenamed | ChangeKind::FolderRenamed, Some(renamed)) => {
            format!("{:?}: {} -> {renamed}", event.kind, event.item)
        }
        _ => format!("{:?}: {}", event.kind, event.item),
    }
}

fn pump_changes(backend: &Backend, router: &ChangeRouter) -> anyhow::Result<()> {
    match backend {
        Backend::Memory(memory) => {
            let delivered = router.dispatch_all(MemoryProvider::drain_notifications(memory));
            println!("{delivered} notification(s) delivered");
            Ok(())
        }
        #[cfg(feature = "host")]
        Backend::Host(_) => bail!("change notifications are only served by manifest namespaces"),
    }
}

fn mutate(
    backend: &Backend,
    browser: &Browser,
    command: &str,
    rest: &str,
) -> anyhow::Result<()> {
    let memory = match backend {
        Backend::Memory(memory) => memory,
        #[cfg(feature = "host")]
        Backend::Host(_) => bail!("`{command}` edits manifest namespaces only"),
    };
    match command {
        "mkdir" => memory.create_folder(&absolute(browser, rest)?)?,
        "touch" => {
            let path = absolute(browser, rest)?;
            match memory.touch(&path) {
                Ok(()) => {}
                Err(ResolveError::NotFound(_)) => memory.create_file(&path)?,
                Err(error) => return Err(error.into()),
            }
        }
        "rm" => memory.remove(&absolute(browser, rest)?)?,
        "ren" => {
            let (target, new_name) = rest
                .split_once(char::is_whitespace)
                .context("usage: ren <path> <new-name>")?;
            memory.rename(&absolute(browser, target)?, new_name.trim())?;
        }
        "mount" => {
            if rest.is_empty() {
                bail!("usage: mount <drive>");
            }
            memory.attach_drive(rest)?;
        }
        "unmount" => {
            if rest.is_empty() {
                bail!("usage: unmount <drive>");
            }
            memory.detach_drive(rest)?;
        }
        _ => unreachable!("mutation commands are matched in dispatch"),
    }
    Ok(())
}

/// Resolves a mutation argument against the current folder's path.
fn absolute(browser: &Browser, name: &str) -> anyhow::Result<String> {
    if name.is_empty() {
        bail!("missing path argument");
    }
    if shellscape::utils::paths::is_absolute(name) {
        return Ok(name.to_string());
    }
    let base = browser
        .current()
        .file_system_path()?
        .context("the current folder has no filesystem path, use an absolute one")?;
    Ok(shellscape::utils::paths::join(&base, name))
}

fn split_command(input: &str) -> (&str, &str) {
    match input.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (input, ""),
    }
}
