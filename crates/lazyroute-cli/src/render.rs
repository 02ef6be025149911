use colored::Colorize;
use lazyroute_nav::{NavigationError, RenderCall, Renderer};
use lazyroute_types::ComponentRef;

use crate::cli::OutputFormat;

/// Prints render calls to stdout.
pub struct ConsoleRenderer {
    format: OutputFormat,
}

impl ConsoleRenderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn emit_json(&self, call: &RenderCall) {
        match serde_json::to_string(call) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(error = %e, "failed to encode render call"),
        }
    }
}

impl Renderer for ConsoleRenderer {
    fn render(&self, component: &ComponentRef) {
        match self.format {
            OutputFormat::Json => self.emit_json(&RenderCall::Render {
                component: component.clone(),
            }),
            OutputFormat::Text => {
                println!("  {} {}", "render".green().bold(), component.to_string().cyan());
                if let Some(template) = &component.template {
                    println!("    {}", template.dimmed());
                }
            }
        }
    }

    fn render_error(&self, error: &NavigationError) {
        match self.format {
            OutputFormat::Json => self.emit_json(&RenderCall::Error {
                kind: error.kind().to_string(),
                message: error.to_string(),
            }),
            OutputFormat::Text => {
                println!("  {} {}", error.kind().red().bold(), error);
            }
        }
    }
}
