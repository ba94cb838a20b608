use std::io::{self, BufRead, Write};
use tracing::warn;

use crate::validation::FilterCriteria;

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> io::Result<String> {
    write!(output, "{question}")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

fn ask_amount<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> io::Result<Option<f64>> {
    let answer = ask(input, output, question)?;
    if answer.is_empty() {
        return Ok(None);
    }

    match answer.replace(',', "").parse::<f64>() {
        Ok(amount) => Ok(Some(amount)),
        Err(e) => {
            warn!(%answer, "ignoring invalid amount: {}", e);
            writeln!(output, "Invalid amount '{answer}', no bound applied")?;
            Ok(None)
        }
    }
}

/// Asks whether to filter and, if so, for a region and an amount range.
/// Blank answers (or end of input) mean "no filter" on that dimension.
pub fn prompt_filter<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<FilterCriteria> {
    let choice = ask(input, output, "Do you want to filter data? (y/n): ")?;
    if !choice.eq_ignore_ascii_case("y") {
        return Ok(FilterCriteria::default());
    }

    let region = ask(input, output, "Enter region (or leave blank): ")?;
    let min_amount = ask_amount(input, output, "Enter minimum amount (or leave blank): ")?;
    let max_amount = ask_amount(input, output, "Enter maximum amount (or leave blank): ")?;

    Ok(FilterCriteria {
        region: (!region.is_empty()).then_some(region),
        min_amount,
        max_amount,
    })
}
