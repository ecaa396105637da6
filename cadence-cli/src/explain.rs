//! Priority-explanation collaborator: turns a ranked snapshot into a short,
//! friendly explanation of why the top tasks come first.

use anyhow::{Context, Result};
use cadence_core::{TaskRecord, assign_ranks, read_records, write_records};
use std::fs;
use std::path::Path;

use crate::llm::{ChatTurn, LlmConfig, chat_complete, strip_reply_fences};

const SYSTEM: &str = "You are an expert academic advisor.";

/// Rank the snapshot in place (the ranked file is written back), then ask
/// the collaborator for an explanation. Optionally saves the text to `out`.
pub fn explain_snapshot(llm: &LlmConfig, path: &Path, out: Option<&Path>) -> Result<String> {
    let mut records = read_records(path)?;
    assign_ranks(&mut records);
    write_records(path, &records)?;

    let text = explain_records(llm, &records)?;
    if let Some(out) = out {
        fs::write(out, &text).with_context(|| format!("write {}", out.display()))?;
    }
    Ok(text)
}

pub fn explain_records(llm: &LlmConfig, records: &[TaskRecord]) -> Result<String> {
    // Only the fields the advisor needs; everything else is noise.
    let filtered: Vec<serde_json::Value> = records
        .iter()
        .map(|r| {
            serde_json::json!({
                "name": r.name,
                "rank": r.rank,
                "importance": r.importance,
                "urgency": r.urgency,
                "mood": r.mood,
            })
        })
        .collect();

    let prompt = format!(
        "The JSON data below represents prioritized assignments, ranked by a \
         weighted score of several factors:\n\
         - \"name\": the assignment.\n\
         - \"rank\": priority position, 1 highest.\n\
         - \"urgency\": 0-100, how tight the remaining time is relative to the \
         remaining work.\n\
         - \"importance\": how much the assignment matters, higher is more.\n\
         - \"mood\": 0-10, the user's current enthusiasm for it, 5 neutral.\n\n\
         Here is the data:\n{}\n\n\
         Explain in a friendly, conversational way why the top assignments are \
         prioritized. Mention when something needs immediate attention because \
         it is urgent or close to its deadline, and when something is important \
         but less pressing. Don't dwell on exact numbers; give the overall \
         message. Answer in plain text.",
        serde_json::to_string_pretty(&filtered)?
    );

    let reply = chat_complete(llm, SYSTEM, &[ChatTurn::user(prompt)])?;
    Ok(strip_reply_fences(&reply))
}
