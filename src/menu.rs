use std::io::{self, BufRead, Write};

use capsule_core::{CreateRequest, TimeCapsule, clean_input_path};
use chrono::NaiveDate;

use crate::util::{describe_outcome, resolve_capsule_path, split_file_list};

fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> io::Result<Option<String>> {
    write!(out, "{label}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Line-driven create/open loop. Errors are printed and the loop continues;
/// end of input exits like option 3. `today` is asked again for every
/// create and open.
pub(crate) fn run_menu<R: BufRead, W: Write>(
    capsules: &TimeCapsule,
    today: impl Fn() -> NaiveDate,
    input: &mut R,
    out: &mut W,
) -> io::Result<()> {
    loop {
        writeln!(out, "\n=== Digital Time Capsule ===")?;
        writeln!(out, "1. Create new time capsule")?;
        writeln!(out, "2. Open existing capsule")?;
        writeln!(out, "3. Exit")?;

        let Some(choice) = prompt(input, out, "Choose an option: ")? else {
            return Ok(());
        };

        match choice.trim() {
            "1" => {
                let Some(title) = prompt(input, out, "Enter capsule title: ")? else {
                    return Ok(());
                };
                let Some(content) = prompt(input, out, "Enter your message: ")? else {
                    return Ok(());
                };
                let Some(unlock_date) = prompt(input, out, "Enter unlock date (DD-MM-YYYY): ")?
                else {
                    return Ok(());
                };
                let Some(files) = prompt(input, out, "Enter file paths (comma-separated): ")?
                else {
                    return Ok(());
                };

                let request = CreateRequest {
                    title,
                    content,
                    unlock_date,
                    files: split_file_list(&files),
                };
                match capsules.create_at(&request, today()) {
                    Ok(report) => {
                        for skipped in &report.skipped {
                            writeln!(out, "Skipped missing file: {}", skipped.display())?;
                        }
                        writeln!(
                            out,
                            "Capsule created successfully! Saved as: {}",
                            report.path.display()
                        )?;
                    }
                    Err(e) => writeln!(out, "Error: {e}")?,
                }
            }
            "2" => {
                let Some(raw) = prompt(input, out, "Enter capsule filename: ")? else {
                    return Ok(());
                };
                let Some(path) = clean_input_path(&raw) else {
                    writeln!(out, "Error: no capsule filename given")?;
                    continue;
                };
                let path = resolve_capsule_path(capsules.root(), path);
                match capsules.open_at(&path, today()) {
                    Ok(outcome) => writeln!(out, "Result: {}", describe_outcome(&outcome))?,
                    Err(e) => writeln!(out, "Error: {e}")?,
                }
            }
            "3" => return Ok(()),
            other => writeln!(out, "Unknown option: {other}")?,
        }
    }
}
