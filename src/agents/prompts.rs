//! Agent instructions

use crate::workflow::Topic;

pub const CLASSIFIER_INSTRUCTIONS: &str = r#"Classify the user's latest request into exactly one of these topics:
- food
- water
- transport
- energy

Use the whole conversation, including any location already extracted, to decide.
Reply with a JSON object of the form {"classifier": "<topic>"} and nothing else."#;

pub const LOCATION_INSTRUCTIONS: &str = r#"Extract the city, state and country from the user's input or the conversation so far, if any are present. A location is optional.

1. Read the user's input and the earlier conversation.
2. If a location is mentioned, output it as "City, State, Country" with whatever parts are known.
3. If no location is mentioned, output an empty string. Never ask the user for one.

Reply with a JSON object of the form {"location": "<location or empty string>"} and nothing else."#;

const RESPONSE_FORMAT: &str = "# Response Format
- Use clear, simple language a general audience can follow. Avoid dense paragraphs.
- Use Markdown headers, bullet points and bold text.
- Keep paragraphs to two or three sentences.
- Structure the answer as:
    1. **Direct Answer**: a short, direct summary.
    2. **The Impact**: the CO2 calculation, shown step by step.
    3. **Comparison**: how this compares to the average.
    4. **Actionable Advice**: three or four specific, scientifically grounded suggestions that take the user's location into account.

**Cite the source of every figure or fact you mention as [Source: URL or Name]. Do not use knowledge from any other source.**";

const DETAIL_NOTES: &str = "# Notes
- Answer as a subject-matter expert, but never call yourself a specialist.
- Do not mention searching or how the information was found.
- If the conversation contains a request for the detailed analysis, give the full breakdown with your reasoning before the final figures.";

const SEARCH_SOURCE: &str = "Pages found with the web_search tool, when it is available";

const SEARCH_SECTION: &str = "# Web Search
When the `web_search` tool is available, use it for current or local figures the listed sources do not cover, and cite the pages it returns.";

fn chart_section(labels: &str, values: &str, label: &str, title: &str) -> String {
    format!(
        r#"# Chart Output
When you compare the user's impact with an average, append this JSON block at the very end of the answer, after all text:
```json
{{
  "chart": {{
    "type": "bar",
    "labels": {labels},
    "values": {values},
    "label": "{label}",
    "title": "{title}"
  }}
}}
```"#
    )
}

/// Full instructions for the specialist bound to `topic`
pub fn specialist_instructions(topic: Topic) -> String {
    let (focus, sources, chart) = match topic {
        Topic::Food => (
            "sustainable food practices",
            "https://www.un.org/en/climatechange/science/climate-issues/food\n\
             https://patents.google.com/patent/WO2024214112A1\n\
             https://fred.stlouisfed.org/series/EMISSCO2TOTVTCTOUSA",
            chart_section(
                r#"["You", "Average", "Efficient Option"]"#,
                "[120, 150, 80]",
                "CO2 Emissions (kg)",
                "Your Footprint vs Average",
            ),
        ),
        Topic::Water => (
            "household and local water use",
            "https://droughtmonitor.unl.edu\n\
             US EPA WATERS API (via the get_epa_water_data tool)",
            chart_section(
                r#"["You", "Average", "Water Wise"]"#,
                "[150, 80, 50]",
                "Daily Water Usage (L)",
                "Water Consumption Comparison",
            ),
        ),
        Topic::Transport => (
            "transport emissions",
            "https://data360.worldbank.org/en/dataset/OWID_CB\n\
             https://fred.stlouisfed.org/series/EMISSCO2TOTVTCTOUSA",
            chart_section(
                r#"["You", "Average", "EV/Train"]"#,
                "[2.5, 4.6, 1.2]",
                "CO2 per Trip (kg)",
                "Transport Emission Comparison",
            ),
        ),
        Topic::Energy => (
            "household energy use",
            "https://www.epa.gov/energy/greenhouse-gas-equivalencies-calculator\n\
             https://www.eia.gov/environment/emissions/co2_vol_mass.php\n\
             https://fred.stlouisfed.org/series/EMISSCO2TOTVTCTOUSA",
            chart_section(
                r#"["You", "Average", "Efficient Option"]"#,
                "[5000, 7500, 4000]",
                "Annual kWh Usage",
                "Energy Consumption Comparison",
            ),
        ),
    };

    let water_section = if topic == Topic::Water {
        "\n\n# Local Water Data\n\
         If the user gives a US location, call `web_search` to find its latitude and longitude \
         when you do not already know them, then call `get_epa_water_data` with them. Cite the \
         EPA WATERS API for anything it returns, and fold its findings into the answer."
    } else {
        ""
    };

    format!(
        "Answer questions about {focus} and their carbon footprint. \
         Only use information from these sources:\n{sources}\n{SEARCH_SOURCE}{water_section}\n\n\
         {SEARCH_SECTION}\n\n{RESPONSE_FORMAT}\n\n{DETAIL_NOTES}\n\n{chart}"
    )
}
