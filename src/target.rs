use {
    super::{error::LinkError, html::Html, link::LinkList},
    chrono::Locale,
    error_stack::{Report, Result, ResultExt},
    jlogger_tracing::{jdebug, jinfo},
    std::{
        fs,
        io::{self, Write},
        path::{Path, PathBuf},
    },
};

pub const LOAD_FAILURE_MESSAGE: &str =
    "⚠️ Could not load links. Check your data/links.json file.";

/// Container the rendered cards are injected into.
pub trait RenderTarget {
    fn set_content(&mut self, html: &str) -> Result<(), LinkError>;
}

/// Writes a whole page to a file, replacing any previous one.
pub struct PageTarget {
    path: PathBuf,
    title: String,
}

impl PageTarget {
    pub fn new(path: &Path, title: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            title: title.to_owned(),
        }
    }
}

impl RenderTarget for PageTarget {
    fn set_content(&mut self, html: &str) -> Result<(), LinkError> {
        let output = self.path.display();

        if self.path.is_dir() {
            return Err(Report::new(LinkError::InvalidValue))
                .attach_printable(format!("{output} is a directory."));
        }

        fs::write(&self.path, Html::page(&self.title, html)).map_err(|e| {
            Report::new(LinkError::IOError)
                .attach_printable(format!("Failed to write result to {output}: {e}"))
        })?;

        jinfo!("Wrote {}", output);
        Ok(())
    }
}

/// Writes a whole page to a stream, standard output for the CLI.
pub struct StreamTarget<W: Write> {
    out: W,
    title: String,
}

impl StreamTarget<io::Stdout> {
    pub fn stdout(title: &str) -> Self {
        Self::new(io::stdout(), title)
    }
}

impl<W: Write> StreamTarget<W> {
    pub fn new(out: W, title: &str) -> Self {
        Self {
            out,
            title: title.to_owned(),
        }
    }
}

impl<W: Write> RenderTarget for StreamTarget<W> {
    fn set_content(&mut self, html: &str) -> Result<(), LinkError> {
        self.out
            .write_all(Html::page(&self.title, html).as_bytes())
            .and_then(|_| self.out.flush())
            .map_err(|e| {
                Report::new(LinkError::IOError)
                    .attach_printable(format!("Failed to write result: {e}"))
            })
    }
}

pub fn render_links(
    links: &LinkList,
    target: &mut dyn RenderTarget,
    locale: Option<Locale>,
) -> Result<(), LinkError> {
    let cards: String = links.links().iter().map(|l| l.render(locale)).collect();

    jdebug!("Rendered {} cards", links.len());
    target.set_content(&cards)
}

pub fn render_failure(target: &mut dyn RenderTarget) -> Result<(), LinkError> {
    target.set_content(&Html::warning(LOAD_FAILURE_MESSAGE))
}
