//! Prompt construction.
//!
//! Three prompts exist: the default regional risk prompt, a wrapper around a
//! caller-supplied prompt, and the personalized prompt built from a user
//! profile.

use field_pipeline::SummaryRecord;
use geo_common::DateRange;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Regional risk analysis asking for a JSON answer.
pub fn default_prompt(summary: &SummaryRecord) -> Result<String> {
    let data = summary.to_pretty_json()?;
    Ok(format!(
        r#"Weather analysis for the region around Türkiye.
Date range: {dates}
Region: {bbox} (lon/lat)

Analysis data:
{data}

Please answer in the following structure:

1. SUMMARY (3 sentences): overall weather situation
2. RISKS:
   - Agriculture: risks for farmers
   - Health: public health risks
   - Transport: traffic and transport risks
3. RECOMMENDATIONS (3 items): practical advice

Respond in JSON: {{"summary": "...", "risks": {{"agriculture": "...", "health": "...", "transport": "..."}}, "recommendations": ["...", "...", "..."]}}
"#,
        dates = summary.dates,
        bbox = summary.bbox,
    ))
}

/// Caller prompt followed by the data and a closing instruction.
pub fn custom_prompt(prompt: &str, summary: &SummaryRecord) -> Result<String> {
    let data = summary.to_pretty_json()?;
    Ok(format!(
        "\n{prompt}\n\nWeather Data for Analysis:\n{data}\n\nPlease provide your analysis based on the above context and data.\n"
    ))
}

/// What a user told us about themselves.
///
/// Field names follow the web client's camelCase payload; every field is
/// optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub name: Option<String>,
    pub location: Option<String>,
    pub purpose: Option<String>,
    pub activities: Vec<String>,
    pub health_conditions: Vec<String>,
    pub lifestyle: Option<String>,
    pub data_interests: Vec<String>,
    pub prediction_preferences: serde_json::Value,
}

/// Readable label for a purpose code; unknown codes pass through.
pub fn purpose_label(purpose: &str) -> &str {
    match purpose {
        "daily_planning" => "daily planning and routine activities",
        "sports" => "sports and fitness activities",
        "travel" => "travel planning",
        "agriculture" => "agricultural activities and farming",
        "events" => "event planning and outdoor gatherings",
        "health" => "health monitoring and medical conditions",
        "business" => "business operations",
        "research" => "scientific research",
        other => other,
    }
}

/// Readable label for a lifestyle code; unknown codes pass through.
pub fn lifestyle_label(lifestyle: &str) -> &str {
    match lifestyle {
        "early_bird" => "prefers morning activities",
        "night_owl" => "more active in evenings",
        "indoor_focused" => "primarily indoor lifestyle",
        "outdoor_enthusiast" => "loves outdoor activities",
        "flexible" => "adapts plans based on weather",
        "scheduled" => "follows fixed daily routines",
        other => other,
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Narrative prompt tailored to `profile` for the requested period.
pub fn personalized_prompt(profile: &UserProfile, custom_query: &str, period: &DateRange) -> String {
    let name = non_empty(&profile.name).unwrap_or("User");
    let location = non_empty(&profile.location).unwrap_or("");

    let mut context = vec![
        format!("This is a personalized weather prediction for {name} in {location}."),
        format!(
            "Prediction period: {} to {}",
            period.start_str(),
            period.end_str()
        ),
    ];
    if let Some(purpose) = non_empty(&profile.purpose) {
        context.push(format!("Primary use case: {}", purpose_label(purpose)));
    }
    if !profile.activities.is_empty() {
        context.push(format!("Regular activities: {}", profile.activities.join(", ")));
    }
    if !profile.health_conditions.is_empty() && !profile.health_conditions.iter().any(|c| c == "none") {
        context.push(format!(
            "Health considerations: {}",
            profile.health_conditions.join(", ")
        ));
    }
    if let Some(lifestyle) = non_empty(&profile.lifestyle) {
        context.push(format!("Lifestyle: {}", lifestyle_label(lifestyle)));
    }
    if !profile.data_interests.is_empty() {
        context.push(format!(
            "Particularly interested in: {}",
            profile.data_interests.join(", ")
        ));
    }
    let context = context.join("\n");

    format!(
        r#"
{context}

User's specific question: {custom_query}

Please provide a comprehensive weather prediction that includes:

1. NUMERICAL FORECAST:
   - Specific temperature ranges, precipitation probabilities, humidity levels, wind speeds
   - Day-by-day breakdown for the prediction period

2. PERSONALIZED INSIGHTS:
   - How the weather will affect their specific activities and lifestyle
   - Recommendations tailored to their health conditions (if any)
   - Best and worst days for their typical activities
   - Timing recommendations based on their lifestyle preferences

3. ACTIONABLE RECOMMENDATIONS:
   - What to wear or bring each day
   - Activity planning suggestions
   - Health alerts or precautions
   - Schedule optimization tips

4. WARNINGS & TIPS:
   - Weather-related risks for their profile
   - Preparation suggestions
   - Alternative indoor activities if needed

Make the response conversational and personal, addressing them by name and referencing their specific needs and preferences. Focus on practical, actionable advice.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(purpose_label("agriculture"), "agricultural activities and farming");
        assert_eq!(purpose_label("fishing"), "fishing");
        assert_eq!(lifestyle_label("night_owl"), "more active in evenings");
        assert_eq!(lifestyle_label("nomad"), "nomad");
    }

    #[test]
    fn test_profile_deserializes_camel_case() {
        let profile: UserProfile = serde_json::from_str(
            r#"{"name": "Deniz", "healthConditions": ["asthma"], "dataInterests": ["wind"]}"#,
        )
        .unwrap();
        assert_eq!(profile.name.as_deref(), Some("Deniz"));
        assert_eq!(profile.health_conditions, vec!["asthma"]);
        assert!(profile.activities.is_empty());
    }
}
