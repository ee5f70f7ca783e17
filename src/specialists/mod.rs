//! Specialist personas and their strict output contracts.
//!
//! Each canonical step is owned by one specialist; the dream step has a
//! secondary one (`DreamExplainer`) for the guided builder exercise. A
//! specialist's reply is a closed JSON object; [`schema`] generates both the
//! schema text sent to the model and the validator applied to what comes
//! back, from one declarative field list.

pub mod output;
pub mod prompts;
pub mod schema;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::StepId;

/// The LLM personas, named as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Specialist {
    ValidationAndBusinessName,
    Dream,
    DreamExplainer,
    Purpose,
    BigWhy,
    Role,
    Entity,
    Strategy,
    TargetGroup,
    ProductsServices,
    RulesOfTheGame,
    Presentation,
}

impl Specialist {
    pub fn as_str(&self) -> &'static str {
        match self {
            Specialist::ValidationAndBusinessName => "ValidationAndBusinessName",
            Specialist::Dream => "Dream",
            Specialist::DreamExplainer => "DreamExplainer",
            Specialist::Purpose => "Purpose",
            Specialist::BigWhy => "BigWhy",
            Specialist::Role => "Role",
            Specialist::Entity => "Entity",
            Specialist::Strategy => "Strategy",
            Specialist::TargetGroup => "TargetGroup",
            Specialist::ProductsServices => "ProductsServices",
            Specialist::RulesOfTheGame => "RulesOfTheGame",
            Specialist::Presentation => "Presentation",
        }
    }

    /// The specialist that owns a step's primary flow.
    pub fn primary_for(step: StepId) -> Specialist {
        match step {
            StepId::Step0 => Specialist::ValidationAndBusinessName,
            StepId::Dream => Specialist::Dream,
            StepId::Purpose => Specialist::Purpose,
            StepId::BigWhy => Specialist::BigWhy,
            StepId::Role => Specialist::Role,
            StepId::Entity => Specialist::Entity,
            StepId::Strategy => Specialist::Strategy,
            StepId::TargetGroup => Specialist::TargetGroup,
            StepId::ProductsServices => Specialist::ProductsServices,
            StepId::RulesOfTheGame => Specialist::RulesOfTheGame,
            StepId::Presentation => Specialist::Presentation,
        }
    }

    /// The step a specialist operates on. `DreamExplainer` runs inside the
    /// dream step.
    pub fn step(&self) -> StepId {
        match self {
            Specialist::ValidationAndBusinessName => StepId::Step0,
            Specialist::Dream | Specialist::DreamExplainer => StepId::Dream,
            Specialist::Purpose => StepId::Purpose,
            Specialist::BigWhy => StepId::BigWhy,
            Specialist::Role => StepId::Role,
            Specialist::Entity => StepId::Entity,
            Specialist::Strategy => StepId::Strategy,
            Specialist::TargetGroup => StepId::TargetGroup,
            Specialist::ProductsServices => StepId::ProductsServices,
            Specialist::RulesOfTheGame => StepId::RulesOfTheGame,
            Specialist::Presentation => StepId::Presentation,
        }
    }
}

impl fmt::Display for Specialist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_step_has_a_primary() {
        for step in StepId::ALL {
            let specialist = Specialist::primary_for(step);
            assert_eq!(specialist.step(), step);
        }
    }

    #[test]
    fn explainer_runs_on_dream() {
        assert_eq!(Specialist::DreamExplainer.step(), StepId::Dream);
        assert_ne!(
            Specialist::primary_for(StepId::Dream),
            Specialist::DreamExplainer
        );
    }

    #[test]
    fn wire_names_are_pascal_case() {
        let json = serde_json::to_string(&Specialist::ValidationAndBusinessName).unwrap();
        assert_eq!(json, "\"ValidationAndBusinessName\"");
    }
}
