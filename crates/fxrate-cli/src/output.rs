use std::io::Write;

use serde::Serialize;

use crate::error::CliError;

pub fn render<T: Serialize>(value: &T, pretty: bool) -> Result<(), CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{payload}");
    Ok(())
}

/// One compact JSON line, flushed immediately so pipes see it.
pub fn render_line<T: Serialize>(value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string(value)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{payload}")?;
    stdout.flush()?;
    Ok(())
}
