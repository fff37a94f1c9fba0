//! Interactive jam prediction prompt.
//!
//! All prompt I/O goes through `BufRead`/`Write` so the validation loops can
//! be exercised in tests. Invalid input re-prompts; a closed input stream
//! ends the session cleanly.

use crate::trainer::model::RoadModel;
use crate::trainer::types::WEEKDAYS;
use anyhow::Result;
use std::io::{BufRead, Write};

/// Reads one trimmed line; `None` means the input stream is closed.
fn read_trimmed<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Normalizes user input like "monday" or "MONDAY" to "Monday".
fn capitalized(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

fn prompt_weekday<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Option<String>> {
    loop {
        write!(out, "Enter weekday (Monday, Tuesday, ..., Sunday): ")?;
        out.flush()?;

        let Some(answer) = read_trimmed(input)? else {
            return Ok(None);
        };
        let day = capitalized(&answer);
        if WEEKDAYS.contains(&day.as_str()) {
            return Ok(Some(day));
        }
        writeln!(
            out,
            "Invalid weekday. Please enter a valid day (Monday, Tuesday, ..., Sunday)."
        )?;
    }
}

fn prompt_value<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    feature: &str,
) -> Result<Option<f64>> {
    loop {
        write!(out, "Enter value for {feature}: ")?;
        out.flush()?;

        let Some(answer) = read_trimmed(input)? else {
            return Ok(None);
        };
        match answer.parse::<f64>() {
            Ok(value) if feature == "Hour" && !(0.0..=23.0).contains(&value) => {
                writeln!(out, "Hour must be between 0 and 23.")?;
            }
            Ok(value) => return Ok(Some(value)),
            Err(_) => writeln!(out, "Please enter a valid number.")?,
        }
    }
}

/// Prompts for a full raw feature vector in the model's feature order.
///
/// Weekday indicator columns are filled from the single weekday answer;
/// every other feature is asked for individually.
pub fn prompt_feature_vector<R: BufRead, W: Write>(
    model: &RoadModel,
    input: &mut R,
    out: &mut W,
) -> Result<Option<Vec<f64>>> {
    let Some(weekday) = prompt_weekday(input, out)? else {
        return Ok(None);
    };

    let mut values = Vec::with_capacity(model.feature_names.len());
    for feature in &model.feature_names {
        if let Some(day) = feature.strip_prefix("is_") {
            values.push(if day == weekday { 1.0 } else { 0.0 });
        } else {
            let Some(value) = prompt_value(input, out, feature)? else {
                return Ok(None);
            };
            values.push(value);
        }
    }

    Ok(Some(values))
}

/// The yes/no prediction session offered after training.
pub fn run_prediction_loop<R: BufRead, W: Write>(
    models: &[RoadModel],
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    if models.is_empty() {
        writeln!(out, "No trained models available for prediction.")?;
        return Ok(());
    }

    loop {
        writeln!(out)?;
        writeln!(out, "Would you like to predict traffic jam for new data? (yes/no)")?;
        let Some(choice) = read_trimmed(input)? else {
            break;
        };
        if !choice.eq_ignore_ascii_case("yes") {
            break;
        }

        writeln!(out)?;
        writeln!(out, "Select road:")?;
        for (i, model) in models.iter().enumerate() {
            writeln!(out, "{}. {}", i + 1, model.road)?;
        }
        write!(out, "Enter 1-{}: ", models.len())?;
        out.flush()?;

        let Some(answer) = read_trimmed(input)? else {
            break;
        };
        let model = match answer.parse::<usize>() {
            Ok(n) if (1..=models.len()).contains(&n) => &models[n - 1],
            _ => {
                writeln!(out, "Invalid choice. Skipping prediction.")?;
                continue;
            }
        };

        writeln!(out)?;
        writeln!(out, "Enter new data for predicting traffic jam on {}:", model.road)?;
        let Some(values) = prompt_feature_vector(model, input, out)? else {
            break;
        };

        let prediction = model.predict_one(&values);
        writeln!(out)?;
        writeln!(out, "Prediction for {}:", model.road)?;
        writeln!(
            out,
            "{}",
            if prediction.jam { "Traffic Jam" } else { "No Traffic Jam" }
        )?;
        writeln!(out, "Probability of Traffic Jam: {:.4}", prediction.p_jam)?;
        writeln!(out, "Probability of No Traffic Jam: {:.4}", prediction.p_clear)?;
    }

    Ok(())
}
