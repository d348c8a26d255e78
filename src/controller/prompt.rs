//! Line-based picker that walks a [`SessionHandle`] field by field.

use std::io::Write;

use anyhow::{bail, Context};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use url::Url;

use super::{
    selector::{Field, FieldPhase},
    session::{FieldView, LoadStatus, SessionError, SessionHandle},
};

/// Ask for each applicable field in order, then resolve.
///
/// Optional fields accept a blank answer. When the selection matches no
/// vehicle the shopper names one field to change and picking resumes there,
/// or answers `reload` to fetch the catalog again and start over.
pub async fn pick<R, W>(session: &SessionHandle, input: R, output: &mut W) -> anyhow::Result<Url>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    wait_ready(session, &mut lines, output).await?;

    let mut start = 0;
    loop {
        for field in &Field::ALL[start..] {
            let view = session.view().await?;
            let field_view = view.field(*field);
            match field_view.phase {
                FieldPhase::Hidden => continue,
                FieldPhase::Locked if field.is_required() => {
                    bail!("no {} options for this selection", field.label().to_lowercase())
                }
                FieldPhase::Locked => continue,
                FieldPhase::EnabledEmpty | FieldPhase::Selected => {}
            }

            let Some(answer) = ask(field_view, &mut lines, output).await? else {
                bail!("input closed before {} was chosen", field);
            };
            session.select(*field, answer).await?;
        }

        match session.resolve().await {
            Ok(url) => return Ok(url),
            Err(SessionError::Unresolved(e)) => {
                writeln!(output, "{} ({})", e, e.detail())?;
                write!(output, "Change which field, or 'reload' to start over? ")?;
                output.flush()?;
                let Some(line) = lines.next_line().await? else {
                    bail!("{}", e);
                };

                if line.trim().eq_ignore_ascii_case("reload") {
                    session.reload().await?;
                    wait_ready(session, &mut lines, output).await?;
                    start = 0;
                    continue;
                }

                let field: Field = line.parse().map_err(anyhow::Error::msg)?;
                session.clear(field).await?;
                start = field as usize;
            }
            Err(e) => return Err(e).context("failed to save the selected vehicle"),
        }
    }
}

// Wait for the catalog; a failed or empty load may be retried.
async fn wait_ready<R, W>(
    session: &SessionHandle,
    lines: &mut tokio::io::Lines<R>,
    output: &mut W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    loop {
        let problem = match session.loaded().await?.status {
            LoadStatus::Ready {
                type_name,
                vehicles,
            } => {
                writeln!(output, "{} vehicles loaded as '{}'", vehicles, type_name)?;
                return Ok(());
            }
            LoadStatus::Loading => continue,
            LoadStatus::Empty => "no vehicles are available".to_string(),
            LoadStatus::Failed(e) => format!("vehicle catalog unavailable: {}", e),
        };

        writeln!(output, "{}", problem)?;
        write!(output, "Retry? [y/N] ")?;
        output.flush()?;
        match lines.next_line().await? {
            Some(answer) if answer.trim().eq_ignore_ascii_case("y") => session.reload().await?,
            _ => bail!(problem),
        }
    }
}

// Prompt until a listed option is chosen by number or name, or a blank is
// given for an optional field. None on end of input.
async fn ask<R, W>(
    view: &FieldView,
    lines: &mut tokio::io::Lines<R>,
    output: &mut W,
) -> anyhow::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(output, "{}:", view.field)?;
    for (i, option) in view.options.iter().enumerate() {
        writeln!(output, "  {:>3}) {}", i + 1, option)?;
    }

    loop {
        if view.field.is_required() {
            write!(output, "> ")?;
        } else {
            write!(output, "> (blank to skip) ")?;
        }
        output.flush()?;

        let Some(line) = lines.next_line().await? else {
            return Ok(None);
        };
        let answer = line.trim();

        if answer.is_empty() && !view.field.is_required() {
            return Ok(Some(String::new()));
        }
        if let Some(option) = answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| view.options.get(i))
        {
            return Ok(Some(option.clone()));
        }
        if let Some(option) = view.options.iter().find(|o| o.eq_ignore_ascii_case(answer)) {
            return Ok(Some(option.clone()));
        }
        writeln!(output, "'{}' is not one of the listed options", answer)?;
    }
}
