//! Versions command implementation.

use fedevent_core::room_versions;
use serde_json::json;

use crate::output::{format_json, format_version_row, print_version_header};

pub fn run(json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let versions = room_versions();

    if json_output {
        let output: serde_json::Map<String, serde_json::Value> = versions
            .iter()
            .map(|(version, desc)| (version.to_string(), json!(desc)))
            .collect();
        println!("{}", format_json(&serde_json::Value::Object(output)));
    } else {
        print_version_header();
        for (version, desc) in versions {
            println!("{}", format_version_row(version.as_str(), desc));
        }
    }
    Ok(())
}
