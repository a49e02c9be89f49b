use serde::{Deserialize, Serialize};

/// One named step of the analysis pipeline. Position in the stage list is
/// significant: every stage before the one currently running is treated as
/// done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default)]
    pub estimated_secs: u64,
}

fn default_icon() -> String {
    "step".to_string()
}

struct StageDefinition {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    icon: &'static str,
    estimated_secs: u64,
}

static DEFAULT_STAGES: &[StageDefinition] = &[
    StageDefinition {
        id: "data_extraction",
        name: "Data Extraction",
        description: "Collecting profile answers, goals and session history",
        icon: "database",
        estimated_secs: 30,
    },
    StageDefinition {
        id: "pattern_analysis",
        name: "Pattern Analysis",
        description: "Identifying recurring behaviours and strengths",
        icon: "search",
        estimated_secs: 60,
    },
    StageDefinition {
        id: "insight_synthesis",
        name: "Insight Synthesis",
        description: "Combining patterns into coaching insights",
        icon: "brain",
        estimated_secs: 90,
    },
    StageDefinition {
        id: "recommendation_generation",
        name: "Recommendation Generation",
        description: "Drafting personalised development recommendations",
        icon: "target",
        estimated_secs: 60,
    },
    StageDefinition {
        id: "report_assembly",
        name: "Report Assembly",
        description: "Assembling the final coaching report",
        icon: "file",
        estimated_secs: 20,
    },
];

/// The built-in coaching analysis pipeline, used when no stages are configured.
pub fn default_stages() -> Vec<Stage> {
    DEFAULT_STAGES
        .iter()
        .map(|d| Stage {
            id: d.id.to_string(),
            name: d.name.to_string(),
            description: d.description.to_string(),
            icon: d.icon.to_string(),
            estimated_secs: d.estimated_secs,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_stages_unique_ids() {
        let stages = default_stages();
        let ids: HashSet<_> = stages.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), stages.len());
    }

    #[test]
    fn test_default_stages_order() {
        let stages = default_stages();
        assert_eq!(stages.first().unwrap().id, "data_extraction");
        assert_eq!(stages.last().unwrap().id, "report_assembly");
    }

    #[test]
    fn test_stage_deserialize_defaults() {
        let stage: Stage = serde_yaml::from_str("id: extract\nname: Extract").unwrap();
        assert_eq!(stage.icon, "step");
        assert_eq!(stage.estimated_secs, 0);
        assert!(stage.description.is_empty());
    }
}
