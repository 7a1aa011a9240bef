//! Prompt templates for the research report.
//!
//! The report follows a fixed academic outline. Search digests gathered by
//! the research graph are inlined so the model can cite current figures.

use shared::research::DetailLevel;

const REPORT_OUTLINE: &str = r#"# Report structure
## 1. Introduction
1. Research background
   - Macro context
   - State of the field
   - Why this research matters
2. Literature review
   - Current research at home and abroad
   - Research hot spots
   - Gaps in existing work
3. Research design
   - Objectives
   - Methods
   - Framework
   - Contributions

## 2. Theoretical foundations
1. Core concepts
   - Multi-dimensional definition of the key concepts
   - How the theory evolved
   - Relationships between concepts
2. Supporting theory
   - Base theories
   - Integration of related theories
   - Theoretical framework
3. Hypotheses
   - Problem statement
   - Derivation
   - How to verify

## 3. Current state
1. Development history
   - Phases
   - Characteristics
   - Patterns
2. Present situation
   - Data analysis
   - Problems identified
   - Root causes
3. Case studies
   - Case 1: detailed analysis
   - Case 2: comparison
   - Lessons learned

## 4. Problems and countermeasures
1. Problem analysis
   - Core problems
   - Influencing factors
   - Knock-on effects
2. Solutions
   - Strategic recommendations
   - Tactical measures
   - Supporting policy
3. Implementation path
   - Overall plan
   - Step-by-step rollout
   - Safeguards

## 5. Outlook
1. Trends
   - Short-term forecast
   - Medium and long-term outlook
   - Key drivers
2. Opportunities and challenges
   - Opportunities
   - Risks
   - Mitigations
3. Future research
   - Limitations
   - Open directions
   - Practical advice"#;

const WRITING_RULES: &str = r#"Please note:
1. Each chapter must build logically on the previous one
2. Theoretical claims need solid argument
3. Empirical claims need concrete data
4. Conclusions must be well founded
5. Recommendations must be actionable
6. Use the formal style of an academic paper
7. Use Markdown with a clear heading hierarchy

Additional requirements:
1. Support the discussion with the search data above
2. Back every point with a specific figure or case
3. Cite recent research and market data
4. Prefer reliable and recent sources
5. Draw insights from the data
6. Analyse real cases in depth
7. Present key data in Markdown tables

Output requirements:
1. Follow the academic report structure strictly
2. Give every subsection substantive content
3. Keep the argument consistent from start to finish
4. Use tables where they help (in Markdown)
5. Connect theory with practice"#;

fn detail_instruction(detail: DetailLevel) -> &'static str {
    match detail {
        DetailLevel::Low => {
            "Level of detail: low. Keep each subsection to a short paragraph and focus on the key findings."
        }
        DetailLevel::Medium => {
            "Level of detail: medium. Give each subsection a few well-supported paragraphs."
        }
        DetailLevel::High => {
            "Level of detail: high. Be exhaustive: discuss every subsection in depth with data, cases and tables."
        }
    }
}

/// Build the report prompt for `topic` from the three search digests.
pub fn research_prompt(
    topic: &str,
    background: &str,
    market: &str,
    cases: &str,
    detail: DetailLevel,
) -> String {
    format!(
        r#"Conduct a systematic, in-depth academic analysis of "{topic}" using the latest data below.

Background data:
{background}

Market analysis:
{market}

Case references:
{cases}

{REPORT_OUTLINE}

{WRITING_RULES}

{detail}
"#,
        detail = detail_instruction(detail),
    )
}

/// Prompt for a one-shot local model: no search digests, same outline.
pub fn direct_prompt(topic: &str, detail: DetailLevel) -> String {
    format!(
        "Write a structured research report in Markdown about \"{topic}\".\n\n{REPORT_OUTLINE}\n\n{}\n",
        detail_instruction(detail)
    )
}

/// Prompt asking a local model to summarize one search hit.
pub fn summary_prompt(snippet: &str) -> String {
    format!("Please summarize the following content: {}", snippet)
}

/// Markdown document shown in place of a report when research fails.
pub fn error_report(err: &str) -> String {
    format!(
        r#"
# An error occurred during research

## Error message
{err}

## Suggestions
1. Check that the API key is correct
2. Make sure the network connection works
3. Verify that the model is available
"#
    )
}
