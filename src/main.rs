mod error;
mod html;
mod link;
mod note;
mod target;

use {
    chrono::Locale,
    clap::Parser,
    error::LinkError,
    error_stack::{Report, Result},
    jlogger_tracing::{jdebug, jerror, jinfo, jwarn, JloggerBuilder, LevelFilter, LogTimeFormat},
    link::LinkList,
    std::{path::Path, process::Command},
    target::{render_failure, render_links, PageTarget, RenderTarget, StreamTarget},
};

#[derive(Parser)]
#[command(author, version, about, long_about= None, help_template="
{before-help}{name} {version}
{author-with-newline}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
")]
struct Cli {
    /// JSON file holding the link records
    #[arg(short, long, default_value = "data/links.json")]
    data: String,

    /// Output page, "-" writes to stdout
    #[arg(short, long, default_value = "index.html")]
    output: String,

    /// Page title
    #[arg(short, long, default_value = "Links")]
    title: String,

    /// Locale used to print dates, e.g. "de_DE"
    #[arg(short = 'L', long)]
    locale: Option<String>,

    /// Program used to view the output page, e.g. "w3m"
    #[arg(short = 'w', long)]
    viewer: Option<String>,

    /// Log file
    #[arg(short, long)]
    log: Option<String>,

    #[arg(short, long, action=clap::ArgAction::Count)]
    verbose: u8,
}

fn locale(name: Option<&str>) -> Option<Locale> {
    let name = name?;

    match Locale::try_from(name) {
        Ok(locale) => Some(locale),
        Err(_) => {
            jwarn!("Unknown locale {}, using default date format.", name);
            None
        }
    }
}

fn view(viewer: &str, output: &str) -> Result<(), LinkError> {
    let mut handle = Command::new(viewer).arg(output).spawn().map_err(|e| {
        Report::new(LinkError::Unexpected)
            .attach_printable(format!("Failed to execute {viewer}: {e}"))
    })?;

    handle.wait().map_err(|e| {
        Report::new(LinkError::Unexpected).attach_printable(format!("{viewer} failed: {e}"))
    })?;

    Ok(())
}

fn main() -> Result<(), LinkError> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        1 => LevelFilter::DEBUG,
        2 => LevelFilter::TRACE,
        _ => LevelFilter::INFO,
    };

    if let Some(log) = cli.log.as_deref() {
        JloggerBuilder::new()
            .log_console(false)
            .log_file(Some((log, false)))
            .max_level(level)
            .log_time(LogTimeFormat::TimeNone)
            .build();
    } else {
        JloggerBuilder::new()
            .max_level(level)
            .log_time(LogTimeFormat::TimeNone)
            .build();
    }

    let locale = locale(cli.locale.as_deref());
    let to_stdout = cli.output == "-";

    let mut target: Box<dyn RenderTarget> = if to_stdout {
        Box::new(StreamTarget::stdout(&cli.title))
    } else {
        Box::new(PageTarget::new(Path::new(&cli.output), &cli.title))
    };

    match LinkList::load(Path::new(&cli.data)) {
        Ok(mut links) => {
            if links.is_empty() {
                jinfo!("No links.");
            }

            links.sort_by_date();
            render_links(&links, target.as_mut(), locale)?;
        }
        Err(e) => {
            jerror!("Could not load links:\n{:?}", e);
            render_failure(target.as_mut())?;
        }
    }

    if let Some(viewer) = cli.viewer.as_deref() {
        if to_stdout {
            jwarn!("Output goes to stdout, not starting {}.", viewer);
        } else {
            jdebug!("Viewing {} with {}", cli.output, viewer);
            view(viewer, &cli.output)?;
        }
    }

    Ok(())
}
