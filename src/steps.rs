//! The pipeline step registry.
//!
//! Every recognized step name maps to a [`StepDescriptor`]: the key holding
//! its method discriminator and one [`SectionSchema`] per method, so each
//! method declares its own parameters, ranges and defaults. Method-conditional
//! defaults that depend on a sibling field's value are expressed as named
//! [`DerivationRule`]s rather than ad hoc branching, keeping the rule set
//! auditable and independently testable.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::errors::SchemaError;
use crate::core::schema::{DefaultValue, FieldKind, FieldRule, Requirement, SectionSchema};

/// One configured pipeline step, derived from a pipeline-section entry.
///
/// Ordering in the document defines execution order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineStep {
    /// The step name (the pipeline-section key).
    pub name: String,
    /// The selected method.
    pub method: String,
    /// The normalized step configuration, discriminator included.
    pub params: Map<String, Value>,
}

/// The schema for one method of a step.
#[derive(Debug, Clone, Copy)]
pub struct MethodSchema {
    /// The method name.
    pub method: &'static str,
    /// The parameter rule table for this method.
    pub schema: SectionSchema,
}

/// A recognized pipeline step.
#[derive(Debug, Clone, Copy)]
pub struct StepDescriptor {
    /// The step name.
    pub name: &'static str,
    /// The key holding the method discriminator.
    pub method_key: &'static str,
    /// One schema per supported method.
    pub methods: &'static [MethodSchema],
}

/// All recognized pipeline steps. None is mandatory by itself; legality of a
/// combination is the state machine's concern.
pub const STEPS: &[StepDescriptor] = &[
    StepDescriptor {
        name: "right_disp_map",
        method_key: "method",
        methods: &[
            MethodSchema {
                method: "none",
                schema: SectionSchema {
                    name: "right_disp_map",
                    fields: &[FieldRule {
                        key: "method",
                        kind: FieldKind::StrIn(&["none"]),
                        requirement: Requirement::Required,
                    }],
                },
            },
            MethodSchema {
                method: "accurate",
                schema: SectionSchema {
                    name: "right_disp_map",
                    fields: &[FieldRule {
                        key: "method",
                        kind: FieldKind::StrIn(&["accurate"]),
                        requirement: Requirement::Required,
                    }],
                },
            },
        ],
    },
    StepDescriptor {
        name: "stereo",
        method_key: "stereo_method",
        methods: &[
            MethodSchema {
                method: "ssd",
                schema: MATCHING_COST_SCHEMA,
            },
            MethodSchema {
                method: "sad",
                schema: MATCHING_COST_SCHEMA,
            },
            MethodSchema {
                method: "census",
                schema: SectionSchema {
                    name: "stereo",
                    fields: &[
                        STEREO_METHOD_RULE,
                        FieldRule {
                            // Census windows are limited by the bit width of
                            // the census signature.
                            key: "window_size",
                            kind: FieldKind::IntIn(&[3, 5]),
                            requirement: Requirement::Defaulted(DefaultValue::Int(5)),
                        },
                        SUBPIX_RULE,
                    ],
                },
            },
            MethodSchema {
                method: "zncc",
                schema: MATCHING_COST_SCHEMA,
            },
        ],
    },
    StepDescriptor {
        name: "disparity",
        method_key: "disparity_method",
        methods: &[MethodSchema {
            method: "wta",
            schema: SectionSchema {
                name: "disparity",
                fields: &[
                    FieldRule {
                        key: "disparity_method",
                        kind: FieldKind::StrIn(&["wta"]),
                        requirement: Requirement::Required,
                    },
                    FieldRule {
                        key: "invalid_disparity",
                        kind: FieldKind::Int,
                        // Default owned by the wta-invalid-disparity
                        // derivation rule.
                        requirement: Requirement::Optional,
                    },
                ],
            },
        }],
    },
    StepDescriptor {
        name: "refinement",
        method_key: "refinement_method",
        methods: &[
            MethodSchema {
                method: "vfit",
                schema: SectionSchema {
                    name: "refinement",
                    fields: &[REFINEMENT_METHOD_RULE],
                },
            },
            MethodSchema {
                method: "quadratic",
                schema: SectionSchema {
                    name: "refinement",
                    fields: &[REFINEMENT_METHOD_RULE],
                },
            },
        ],
    },
    StepDescriptor {
        name: "filter",
        method_key: "filter_method",
        methods: &[
            MethodSchema {
                method: "median",
                schema: SectionSchema {
                    name: "filter",
                    fields: &[
                        FILTER_METHOD_RULE,
                        FieldRule {
                            key: "filter_size",
                            kind: FieldKind::OddInt { min: 3, max: 11 },
                            requirement: Requirement::Defaulted(DefaultValue::Int(3)),
                        },
                    ],
                },
            },
            MethodSchema {
                method: "bilateral",
                schema: SectionSchema {
                    name: "filter",
                    fields: &[
                        FILTER_METHOD_RULE,
                        FieldRule {
                            key: "sigma_color",
                            kind: FieldKind::Float,
                            requirement: Requirement::Defaulted(DefaultValue::Float(2.0)),
                        },
                        FieldRule {
                            key: "sigma_space",
                            kind: FieldKind::Float,
                            requirement: Requirement::Defaulted(DefaultValue::Float(6.0)),
                        },
                    ],
                },
            },
        ],
    },
    StepDescriptor {
        name: "validation",
        method_key: "validation_method",
        methods: &[MethodSchema {
            method: "cross_checking",
            schema: SectionSchema {
                name: "validation",
                fields: &[
                    FieldRule {
                        key: "validation_method",
                        kind: FieldKind::StrIn(&["cross_checking"]),
                        requirement: Requirement::Required,
                    },
                    FieldRule {
                        key: "cross_checking_threshold",
                        kind: FieldKind::Float,
                        // Default owned by the cross-checking-threshold
                        // derivation rule.
                        requirement: Requirement::Optional,
                    },
                    FieldRule {
                        key: "right_left_mode",
                        kind: FieldKind::StrIn(&["none", "accurate"]),
                        // Default copied from the right_disp_map step.
                        requirement: Requirement::Optional,
                    },
                ],
            },
        }],
    },
];

const STEREO_METHOD_RULE: FieldRule = FieldRule {
    key: "stereo_method",
    kind: FieldKind::StrIn(&["ssd", "sad", "census", "zncc"]),
    requirement: Requirement::Required,
};

const SUBPIX_RULE: FieldRule = FieldRule {
    key: "subpix",
    kind: FieldKind::IntIn(&[1, 2, 4]),
    requirement: Requirement::Defaulted(DefaultValue::Int(1)),
};

/// Shared schema for window-based matching-cost methods.
const MATCHING_COST_SCHEMA: SectionSchema = SectionSchema {
    name: "stereo",
    fields: &[
        STEREO_METHOD_RULE,
        FieldRule {
            key: "window_size",
            kind: FieldKind::OddInt { min: 3, max: 21 },
            requirement: Requirement::Defaulted(DefaultValue::Int(5)),
        },
        SUBPIX_RULE,
    ],
};

const REFINEMENT_METHOD_RULE: FieldRule = FieldRule {
    key: "refinement_method",
    kind: FieldKind::StrIn(&["vfit", "quadratic"]),
    requirement: Requirement::Required,
};

const FILTER_METHOD_RULE: FieldRule = FieldRule {
    key: "filter_method",
    kind: FieldKind::StrIn(&["median", "bilateral"]),
    requirement: Requirement::Required,
};

/// How a derived field's value is computed.
#[derive(Debug, Clone, Copy)]
pub enum Derivation {
    /// A constant tied to the triggering method.
    Const(DefaultValue),
    /// Copied from a field of a sibling step.
    CopyFrom {
        /// The sibling step name.
        step: &'static str,
        /// The field to copy.
        field: &'static str,
    },
}

/// A named method-conditional default: fires when `step` is configured with
/// `method` and the user omitted `field`.
#[derive(Debug, Clone, Copy)]
pub struct DerivationRule {
    /// Rule name, for auditing and logs.
    pub name: &'static str,
    /// The step the rule targets.
    pub step: &'static str,
    /// The method that triggers the rule.
    pub method: &'static str,
    /// The field the rule computes.
    pub field: &'static str,
    /// How the value is computed.
    pub derivation: Derivation,
}

/// The method-conditional defaults of the pipeline section.
pub const DERIVATION_RULES: &[DerivationRule] = &[
    DerivationRule {
        name: "wta-invalid-disparity",
        step: "disparity",
        method: "wta",
        field: "invalid_disparity",
        derivation: Derivation::Const(DefaultValue::Int(-9999)),
    },
    DerivationRule {
        name: "cross-checking-threshold",
        step: "validation",
        method: "cross_checking",
        field: "cross_checking_threshold",
        derivation: Derivation::Const(DefaultValue::Float(1.0)),
    },
    DerivationRule {
        name: "cross-checking-right-left-mode",
        step: "validation",
        method: "cross_checking",
        field: "right_left_mode",
        derivation: Derivation::CopyFrom {
            step: "right_disp_map",
            field: "method",
        },
    },
];

/// Validates every entry of the `pipeline` section against its step and
/// method schema, in document order, and returns the ordered step sequence.
pub fn check_pipeline_section(
    pipeline: &Map<String, Value>,
) -> Result<Vec<PipelineStep>, SchemaError> {
    let mut steps = Vec::with_capacity(pipeline.len());

    for (name, value) in pipeline {
        let descriptor = STEPS
            .iter()
            .find(|descriptor| descriptor.name == name.as_str())
            .ok_or_else(|| SchemaError::UnknownStep { step: name.clone() })?;

        let entry = value.as_object().ok_or_else(|| {
            SchemaError::invalid_section(name.clone(), format!("expected an object, got {value}"))
        })?;

        let method = entry
            .get(descriptor.method_key)
            .ok_or_else(|| SchemaError::missing_field(name.clone(), descriptor.method_key))?
            .as_str()
            .ok_or_else(|| {
                SchemaError::invalid_field(
                    name.clone(),
                    descriptor.method_key,
                    "a method name",
                    entry[descriptor.method_key].to_string(),
                )
            })?;

        let method_schema = descriptor
            .methods
            .iter()
            .find(|candidate| candidate.method == method)
            .ok_or_else(|| SchemaError::UnknownMethod {
                step: name.clone(),
                method: method.to_string(),
            })?;

        steps.push(PipelineStep {
            name: name.clone(),
            method: method.to_string(),
            params: method_schema.schema.check(entry)?,
        });
    }

    Ok(steps)
}

/// Prepends the no-op `right_disp_map` placeholder step when the user did not
/// configure one. It still participates in state-machine transitions, so it
/// goes first: its transitions are only legal from the initial state.
pub fn ensure_right_disp_map(steps: &mut Vec<PipelineStep>) {
    if steps.iter().any(|step| step.name == "right_disp_map") {
        return;
    }
    let mut params = Map::new();
    params.insert("method".to_string(), Value::from("none"));
    steps.insert(
        0,
        PipelineStep {
            name: "right_disp_map".to_string(),
            method: "none".to_string(),
            params,
        },
    );
}

/// Applies every [`DerivationRule`] whose trigger matches a configured step
/// and whose target field the user omitted.
pub fn apply_derivations(steps: &mut [PipelineStep]) -> Result<(), SchemaError> {
    for rule in DERIVATION_RULES {
        let Some(target) = steps
            .iter()
            .position(|step| step.name == rule.step && step.method == rule.method)
        else {
            continue;
        };
        if steps[target].params.contains_key(rule.field) {
            continue;
        }

        let value = match rule.derivation {
            Derivation::Const(default) => default.to_value(),
            Derivation::CopyFrom { step, field } => steps
                .iter()
                .find(|sibling| sibling.name == step)
                .and_then(|sibling| sibling.params.get(field))
                .cloned()
                .ok_or_else(|| SchemaError::missing_field(step, field))?,
        };

        tracing::debug!(rule = rule.name, field = rule.field, %value, "derived default");
        steps[target].params.insert(rule.field.to_string(), value);
    }

    Ok(())
}
