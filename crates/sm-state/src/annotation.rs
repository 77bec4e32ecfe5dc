//! Baseline-step annotations in product headers
//!
//! Each committed step is written as one comment line:
//!
//! ```text
//! |<ABLC> SF:0, EF:2.5, SA:0, EA:40, ORDER:MEAN
//! |<VBLC> SF:1, EF:12, SA:0, EA:40, ORDER:ORDER2
//! ```
//!
//! The tag letter is the trace the fit was made on and `ORDER` is the order
//! as requested. The final order and target are derived again on parse.

use std::sync::LazyLock;

use regex::Regex;
use sm_core::{
    BaselineOrder, DataType, ProcessingConfig, SmError, SmResult, SourceRecord, TimeWindow,
};

use crate::{BaselineStep, CorrectionRequest, WaveformState};

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[AV]BL[A-Z]*>").expect("valid tag pattern"));

static STEP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"<([AV])BL[A-Z]*>\s*SF:\s*([^,\s]+)\s*,\s*EF:\s*([^,\s]+)\s*,\s*SA:\s*([^,\s]+)\s*,\s*EA:\s*([^,\s]+)\s*,\s*ORDER:\s*([A-Za-z0-9]+)",
    )
    .expect("valid step pattern")
});

/// Annotation line for one step
pub fn format_baseline_step(step: &BaselineStep) -> String {
    let fit = step.fit_window();
    let app = step.app_window();
    format!(
        "|<{}BLC> SF:{}, EF:{}, SA:{}, EA:{}, ORDER:{}",
        step.source_type().tag_letter(),
        fit.start,
        fit.stop,
        app.start,
        app.stop,
        step.order_original().name()
    )
}

/// Decode all baseline steps found in `lines`, in order.
///
/// Untagged lines are ignored. Tagged lines that cannot be decoded are
/// skipped with a warning.
pub fn parse_baseline_steps<S: AsRef<str>>(lines: &[S]) -> Vec<BaselineStep> {
    let mut steps = Vec::new();
    for line in lines {
        let line = line.as_ref();
        if !TAG.is_match(line) {
            continue;
        }
        match parse_line(line, steps.len()) {
            Ok(step) => steps.push(step),
            Err(e) => log::warn!("Skipping annotation: {e}"),
        }
    }
    steps
}

fn parse_line(line: &str, sequence_index: usize) -> SmResult<BaselineStep> {
    let fail = |reason: String| SmError::AnnotationParse {
        line: line.to_string(),
        reason,
    };

    let caps = STEP
        .captures(line)
        .ok_or_else(|| fail("expected SF, EF, SA, EA and ORDER fields".to_string()))?;

    let source_type = match &caps[1] {
        "V" => DataType::Vel,
        _ => DataType::Acc,
    };
    let number = |i: usize, name: &str| -> SmResult<f64> {
        let value = caps[i]
            .parse::<f64>()
            .map_err(|e| fail(format!("{name}: {e}")))?;
        if !value.is_finite() || value < 0.0 {
            return Err(fail(format!("{name}: {value} is not a time in the record")));
        }
        Ok(value)
    };
    let window = |start: (usize, &str), stop: (usize, &str)| -> SmResult<TimeWindow> {
        let window = TimeWindow::new(number(start.0, start.1)?, number(stop.0, stop.1)?);
        if window.start > window.stop {
            return Err(fail(format!(
                "{} = {} is after {} = {}",
                start.1, window.start, stop.1, window.stop
            )));
        }
        Ok(window)
    };
    let fit = window((2, "SF"), (3, "EF"))?;
    let app = window((4, "SA"), (5, "EA"))?;

    let order = BaselineOrder::from_name(&caps[6])
        .ok_or_else(|| fail(format!("unknown order {}", &caps[6])))?;

    BaselineStep::resolve(source_type, order, fit, app, sequence_index)
        .map_err(|e| fail(e.to_string()))
}

/// Rebuild a state from a product's annotations and its source record.
///
/// The decoded steps are committed in order against a fresh state, so the
/// result is CORRECTED (or RESET when no step was found) and must be
/// filtered again before it can be committed.
pub fn reconstruct_from_annotations<S: AsRef<str>>(
    record: &dyn SourceRecord,
    lines: &[S],
    config: &ProcessingConfig,
    onset: Option<f64>,
) -> SmResult<WaveformState> {
    let mut state = WaveformState::create(record, config, onset)?;
    let steps = parse_baseline_steps(lines);
    for step in &steps {
        let request = CorrectionRequest::new(
            step.source_type(),
            step.order_original(),
            step.fit_window(),
            step.app_window(),
        );
        state.correct(&request, config.spline_knot_spacing)?;
    }
    log::info!(
        "Reconstructed {} from {} annotation steps",
        state.channel_id(),
        steps.len()
    );
    Ok(state)
}
