use crate::domain::model::Sample;
use crate::report::summary::RunSummary;
use crate::utils::error::{Result, SimError};

pub fn trace_to_csv<'a, I>(samples: I) -> Result<String>
where
    I: IntoIterator<Item = &'a Sample>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    for sample in samples {
        writer.serialize(sample)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| SimError::IoError(e.into_error()))?;

    String::from_utf8(bytes).map_err(|e| SimError::ProcessingError {
        message: format!("CSV output is not valid UTF-8: {}", e),
    })
}

pub fn summary_to_json(summary: &RunSummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}
