//! JSON edit scripts.
//!
//! A script is a JSON array of steps, each tagged with an `op`, mirroring
//! the pipeline's method chain:
//!
//! ```json
//! [
//!   { "op": "zip", "quality": 0.2, "width": 300 },
//!   { "op": "rotate", "degrees": 90 },
//!   { "op": "mix", "src": "./badge.png", "x": 10, "y": 10, "width": 100 },
//!   { "op": "clip", "x": 20, "y": 20, "width": 150, "height": 150, "radius": 15 },
//!   { "op": "scale", "x": 5 }
//! ]
//! ```
//!
//! Omitted fields take the pipeline's defaults.

use anyhow::Context as _;
use fastimg_core::Pipeline;
use serde::Deserialize;

fn default_quality() -> f64 {
    0.5
}

fn default_scale() -> f64 {
    1.0
}

/// One step of an edit script.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum EditStep {
    Zip {
        #[serde(default = "default_quality")]
        quality: f64,
        width: Option<f64>,
        height: Option<f64>,
        #[serde(rename = "type")]
        mime: Option<String>,
    },
    Rotate {
        #[serde(default)]
        degrees: f64,
    },
    Clip {
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
        width: f64,
        height: f64,
        #[serde(default)]
        radius: f64,
    },
    Scale {
        #[serde(default = "default_scale")]
        x: f64,
        y: Option<f64>,
    },
    Mix {
        src: String,
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
        width: Option<f64>,
        height: Option<f64>,
    },
}

/// Parse a JSON script into steps.
pub fn parse(json: &str) -> anyhow::Result<Vec<EditStep>> {
    serde_json::from_str(json).context("invalid edit script")
}

/// Run every step against a ready pipeline, in order.
pub async fn run(pipeline: &mut Pipeline, steps: &[EditStep]) -> anyhow::Result<()> {
    for (index, step) in steps.iter().enumerate() {
        apply(pipeline, step)
            .await
            .with_context(|| format!("step {index} ({step:?}) failed"))?;
    }
    Ok(())
}

async fn apply(pipeline: &mut Pipeline, step: &EditStep) -> anyhow::Result<()> {
    match step {
        EditStep::Zip {
            quality,
            width,
            height,
            mime,
        } => {
            pipeline
                .zip(*quality, *width, *height, mime.as_deref())
                .await?
        }
        EditStep::Rotate { degrees } => pipeline.rotate(*degrees).await?,
        EditStep::Clip {
            x,
            y,
            width,
            height,
            radius,
        } => pipeline.clip(*x, *y, *width, *height, *radius).await?,
        EditStep::Scale { x, y } => pipeline.scale(*x, *y).await?,
        EditStep::Mix {
            src,
            x,
            y,
            width,
            height,
        } => {
            pipeline
                .mix(src.as_str(), *x, *y, *width, *height)
                .await?
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_demo_chain() {
        let steps = parse(
            r#"[
                { "op": "zip", "quality": 0.2, "width": 300 },
                { "op": "rotate", "degrees": 90 },
                { "op": "mix", "src": "./2.png", "x": 10, "y": 10, "width": 100 },
                { "op": "clip", "x": 20, "y": 20, "width": 150, "height": 150, "radius": 15 },
                { "op": "scale", "x": 5 }
            ]"#,
        )
        .unwrap();

        assert_eq!(steps.len(), 5);
        assert!(matches!(
            steps[0],
            EditStep::Zip {
                quality,
                width: Some(w),
                height: None,
                ..
            } if quality == 0.2 && w == 300.0
        ));
        assert!(matches!(steps[4], EditStep::Scale { x, y: None } if x == 5.0));
    }

    #[test]
    fn test_defaults_fill_in() {
        let steps = parse(r#"[{ "op": "zip" }, { "op": "rotate" }]"#).unwrap();
        assert!(matches!(
            steps[0],
            EditStep::Zip { quality, .. } if quality == 0.5
        ));
        assert!(matches!(steps[1], EditStep::Rotate { degrees } if degrees == 0.0));
    }

    #[test]
    fn test_clip_requires_geometry() {
        // width/height are mandatory for clip.
        assert!(parse(r#"[{ "op": "clip", "x": 1 }]"#).is_err());
    }

    #[test]
    fn test_unknown_op_rejected() {
        assert!(parse(r#"[{ "op": "sharpen" }]"#).is_err());
    }
}
