use std::io::Write;

use color_print::cwriteln;
use eyre::Result;

use super::conversation_state::{Role, Turn};
use super::dispatcher::Listing;

/// Writes user and assistant turns with "You:" / "AI:" labels. The system
/// turn is never shown.
pub fn write_transcript(output: &mut dyn Write, turns: &[Turn], with_timestamps: bool) -> Result<()> {
    for turn in turns {
        let stamp = if with_timestamps {
            format!("[{}] ", turn.timestamp.format("%H:%M:%S"))
        } else {
            String::new()
        };
        match turn.role {
            Role::User => cwriteln!(output, "{}<bold>You:</bold> {}", stamp, turn.content)?,
            Role::Assistant => cwriteln!(output, "{}<bold><cyan>AI:</cyan></bold> {}", stamp, turn.content)?,
            Role::System => {}
        }
    }
    Ok(())
}

pub fn write_product_cards(output: &mut dyn Write, listings: &[Listing]) -> Result<()> {
    cwriteln!(output, "\n<bold>### Top Products</bold>")?;
    if listings.is_empty() {
        cwriteln!(output, "<dim>No products found.</dim>")?;
        return Ok(());
    }
    for listing in listings {
        cwriteln!(output, "<bold>{}</bold> <blue><underline>{}</underline></blue>", listing.title, listing.link)?;
        cwriteln!(output, "<italic>{}</italic>", listing.source)?;
        writeln!(output, "{}", listing.snippet)?;
        writeln!(output, "---")?;
    }
    Ok(())
}

pub fn write_status(output: &mut dyn Write, message: &str) -> Result<()> {
    cwriteln!(output, "<dim>{}</dim>", message)?;
    output.flush()?;
    Ok(())
}

pub fn write_warning(output: &mut dyn Write, message: &str) -> Result<()> {
    cwriteln!(output, "<yellow>⚠ {}</yellow>", message)?;
    Ok(())
}
