//! Coercion and cascade of values across vocabulary edits.
//!
//! # Responsibility
//! - Decide what happens to one value when its slot changes
//!   (`coerce_value`).
//! - Map a whole matrix from an old element shape to a new one
//!   (`cascade_matrix`), or positionally onto another element
//!   (`rebind_matrix`).
//!
//! # Invariants
//! - All functions here are pure: same inputs, same output, no database
//!   access.
//! - Output matrices always have exactly the arity of the target element.
//! - A value that does not fit its new slot becomes Undefined, or is clamped
//!   when the policy says so; it is never left invalid.

use crate::config::{CoercionMode, CoercionPolicy, RangePolicy};
use crate::model::id::Id;
use crate::model::matrix::Matrix;
use crate::model::value::DataValue;
use crate::model::vocab::{ArgConstraint, ArgType, FormalArgument, VocabElement};

/// Moves `value` from slot `from` into slot `to`.
///
/// | from \ to            | outcome                                     |
/// |----------------------|---------------------------------------------|
/// | Undefined            | Undefined                                   |
/// | same tag             | kept if it fits the new constraint          |
/// | Text -> Nominal      | kept if it is a valid (approved) nominal    |
/// | Nominal -> Text      | kept                                        |
/// | Integer -> Float     | widened                                     |
/// | Float -> Integer     | kept only when integral and within `i64`    |
/// | any -> Untyped       | kept if the slot admits it                  |
/// | Predicate <-> other  | Undefined                                   |
/// | anything else        | Undefined                                   |
///
/// Numeric values outside the new range are clamped or dropped per
/// `policy.out_of_range`. `CoercionMode::AlwaysUndefined` drops every value
/// whose slot type changed.
pub fn coerce_value(
    value: &DataValue,
    from: &FormalArgument,
    to: &FormalArgument,
    policy: &CoercionPolicy,
) -> DataValue {
    if value.is_undefined() {
        return DataValue::Undefined;
    }
    if from.arg_type() != to.arg_type() && policy.mode == CoercionMode::AlwaysUndefined {
        return DataValue::Undefined;
    }

    let candidate = match (value, to.arg_type()) {
        (_, ArgType::Untyped) => Some(value.clone()),
        (DataValue::Text(text) | DataValue::Nominal(text), ArgType::Text) => {
            Some(DataValue::Text(text.clone()))
        }
        (DataValue::Text(text) | DataValue::Nominal(text), ArgType::Nominal) => {
            Some(DataValue::Nominal(text.clone()))
        }
        (DataValue::Integer(value), ArgType::Integer) => Some(DataValue::Integer(*value)),
        (DataValue::Float(value), ArgType::Integer) => {
            float_to_integer(*value).map(DataValue::Integer)
        }
        (DataValue::Integer(value), ArgType::Float) => Some(DataValue::Float(*value as f64)),
        (DataValue::Float(value), ArgType::Float) => Some(DataValue::Float(*value)),
        (DataValue::TimeStamp(ts), ArgType::TimeStamp) => Some(DataValue::TimeStamp(*ts)),
        (DataValue::Predicate(predicate), ArgType::Predicate) => {
            Some(DataValue::Predicate(predicate.clone()))
        }
        _ => None,
    };

    match candidate {
        Some(candidate) => fit_slot(candidate, to, policy),
        None => DataValue::Undefined,
    }
}

/// Reshapes `matrix`, built against `old`, to the shape of `new`.
///
/// Slots are matched by formal argument id: surviving arguments carry their
/// coerced value, new arguments start Undefined, removed ones are dropped.
pub fn cascade_matrix(
    old: &VocabElement,
    new: &VocabElement,
    matrix: &Matrix,
    policy: &CoercionPolicy,
) -> Matrix {
    let values = new
        .formal_args()
        .iter()
        .map(|new_arg| {
            if !new_arg.id().is_valid() {
                return DataValue::Undefined;
            }
            old.position_of_arg(new_arg.id())
                .and_then(|position| {
                    let old_arg = &old.formal_args()[position];
                    matrix
                        .arg(position)
                        .map(|value| coerce_value(value, old_arg, new_arg, policy))
                })
                .unwrap_or(DataValue::Undefined)
        })
        .collect();

    Matrix::from_parts(new.id(), new.formal_args().to_vec(), values)
}

/// Moves the values of `matrix` onto `target` slot by slot, by position.
pub fn rebind_matrix(matrix: &Matrix, target: &VocabElement, policy: &CoercionPolicy) -> Matrix {
    let values = target
        .formal_args()
        .iter()
        .enumerate()
        .map(
            |(position, to)| match (matrix.arg(position), matrix.formal_args().get(position)) {
                (Some(value), Some(from)) => coerce_value(value, from, to, policy),
                _ => DataValue::Undefined,
            },
        )
        .collect();

    Matrix::from_parts(target.id(), target.formal_args().to_vec(), values)
}

/// Applies a predicate element edit to every predicate value bound to it
/// inside `matrix`, at any depth. Returns how many values were reshaped.
pub(crate) fn cascade_nested_predicates(
    matrix: &mut Matrix,
    old: &VocabElement,
    new: &VocabElement,
    policy: &CoercionPolicy,
) -> usize {
    let mut touched = 0;
    for value in matrix.values_mut() {
        if let DataValue::Predicate(predicate) = value {
            if predicate.pve_id() == new.id() {
                let reshaped = cascade_matrix(old, new, predicate.args(), policy);
                predicate.rebind(new.id(), reshaped);
                touched += 1;
            }
            touched += cascade_nested_predicates(predicate.args_mut(), old, new, policy);
        }
    }
    touched
}

/// Replaces every predicate value bound to `pve_id` with Undefined, at any
/// depth. Returns how many values were cleared.
pub(crate) fn invalidate_predicate(matrix: &mut Matrix, pve_id: Id) -> usize {
    let mut cleared = 0;
    for value in matrix.values_mut() {
        let bound_to_target =
            matches!(value, DataValue::Predicate(predicate) if predicate.pve_id() == pve_id);
        if bound_to_target {
            *value = DataValue::Undefined;
            cleared += 1;
        } else if let DataValue::Predicate(predicate) = value {
            cleared += invalidate_predicate(predicate.args_mut(), pve_id);
        }
    }
    cleared
}

fn fit_slot(candidate: DataValue, to: &FormalArgument, policy: &CoercionPolicy) -> DataValue {
    if to.check_value(&candidate).is_ok() {
        return candidate;
    }
    if policy.out_of_range != RangePolicy::Clamp {
        return DataValue::Undefined;
    }
    match (candidate, to.constraint()) {
        (DataValue::Integer(value), ArgConstraint::IntRange { min, max }) => {
            DataValue::Integer(value.clamp(*min, *max))
        }
        (DataValue::Float(value), ArgConstraint::FloatRange { min, max }) if value.is_finite() => {
            DataValue::Float(value.clamp(*min, *max))
        }
        _ => DataValue::Undefined,
    }
}

fn float_to_integer(value: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound.
    let in_bounds = value >= i64::MIN as f64 && value < i64::MAX as f64;
    if value.fract() == 0.0 && in_bounds {
        Some(value as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::id::Id;
    use crate::model::predicate::Predicate;
    use crate::model::time::TimeStamp;
    use crate::model::vocab::ColumnType;
    use std::collections::BTreeSet;

    fn arg(name: &str, arg_type: ArgType) -> FormalArgument {
        FormalArgument::new(name, arg_type).unwrap()
    }

    fn clamp_policy() -> CoercionPolicy {
        CoercionPolicy {
            mode: CoercionMode::BestEffort,
            out_of_range: RangePolicy::Clamp,
        }
    }

    fn with_ids(mut element: VocabElement, ids: &[i64]) -> VocabElement {
        for (arg, raw) in element.formal_args_mut().iter_mut().zip(ids) {
            arg.assign_id(Id::from_raw(*raw));
        }
        element
    }

    #[test]
    fn text_to_nominal_requires_nominal_alphabet() {
        let policy = CoercionPolicy::default();
        let text = arg("a", ArgType::Text);
        let nominal = arg("a", ArgType::Nominal);

        assert_eq!(
            coerce_value(&DataValue::text("point"), &text, &nominal, &policy),
            DataValue::nominal("point")
        );
        assert_eq!(
            coerce_value(&DataValue::text("a, b"), &text, &nominal, &policy),
            DataValue::Undefined
        );
        assert_eq!(
            coerce_value(&DataValue::nominal("left"), &nominal, &text, &policy),
            DataValue::text("left")
        );
    }

    #[test]
    fn numeric_out_of_range_is_dropped_by_default_and_clamped_on_request() {
        let wide = arg("n", ArgType::Integer);
        let narrow = arg("n", ArgType::Integer)
            .with_constraint(ArgConstraint::IntRange { min: 0, max: 10 })
            .unwrap();

        let value = DataValue::Integer(42);
        assert_eq!(
            coerce_value(&value, &wide, &narrow, &CoercionPolicy::default()),
            DataValue::Undefined
        );
        assert_eq!(
            coerce_value(&value, &wide, &narrow, &clamp_policy()),
            DataValue::Integer(10)
        );
    }

    #[test]
    fn float_narrows_to_integer_only_when_integral() {
        let policy = CoercionPolicy::default();
        let float = arg("x", ArgType::Float);
        let integer = arg("x", ArgType::Integer);

        assert_eq!(
            coerce_value(&DataValue::Float(3.0), &float, &integer, &policy),
            DataValue::Integer(3)
        );
        assert_eq!(
            coerce_value(&DataValue::Float(3.5), &float, &integer, &policy),
            DataValue::Undefined
        );
        assert_eq!(
            coerce_value(&DataValue::Integer(7), &integer, &float, &policy),
            DataValue::Float(7.0)
        );
        assert_eq!(
            coerce_value(&DataValue::Float(1e300), &float, &integer, &policy),
            DataValue::Undefined
        );
    }

    #[test]
    fn predicate_slots_never_exchange_values_with_scalars() {
        let policy = CoercionPolicy::default();
        let pred = arg("p", ArgType::Predicate);
        let text = arg("p", ArgType::Text);

        let value = DataValue::Predicate(Predicate::unset());
        assert_eq!(
            coerce_value(&value, &pred, &text, &policy),
            DataValue::Undefined
        );
        assert_eq!(
            coerce_value(&DataValue::text("x"), &text, &pred, &policy),
            DataValue::Undefined
        );
    }

    #[test]
    fn always_undefined_mode_drops_retyped_values_only() {
        let policy = CoercionPolicy {
            mode: CoercionMode::AlwaysUndefined,
            out_of_range: RangePolicy::Undefined,
        };
        let integer = arg("x", ArgType::Integer);
        let float = arg("x", ArgType::Float);

        assert_eq!(
            coerce_value(&DataValue::Integer(2), &integer, &float, &policy),
            DataValue::Undefined
        );
        assert_eq!(
            coerce_value(&DataValue::Integer(2), &integer, &integer, &policy),
            DataValue::Integer(2)
        );
    }

    #[test]
    fn nominal_set_and_time_stamp_rules() {
        let policy = CoercionPolicy::default();
        let open = arg("hand", ArgType::Nominal);
        let approved = arg("hand", ArgType::Nominal)
            .with_constraint(ArgConstraint::NominalSet {
                values: BTreeSet::from(["left".to_string(), "right".to_string()]),
            })
            .unwrap();
        assert_eq!(
            coerce_value(&DataValue::nominal("left"), &open, &approved, &policy),
            DataValue::nominal("left")
        );
        assert_eq!(
            coerce_value(&DataValue::nominal("both"), &open, &approved, &policy),
            DataValue::Undefined
        );

        let ts = arg("at", ArgType::TimeStamp);
        let value = DataValue::TimeStamp(TimeStamp::from_millis(5).unwrap());
        assert_eq!(coerce_value(&value, &ts, &ts, &policy), value);
        assert_eq!(
            coerce_value(&value, &ts, &arg("at", ArgType::Integer), &policy),
            DataValue::Undefined
        );
        assert_eq!(
            coerce_value(&value, &ts, &arg("at", ArgType::Untyped), &policy),
            value
        );
    }

    #[test]
    fn cascade_matches_slots_by_argument_id() {
        let policy = CoercionPolicy::default();
        let mut old = VocabElement::new_matrix("gesture", ColumnType::Matrix).unwrap();
        old.insert_formal_arg(0, arg("hand", ArgType::Nominal)).unwrap();
        old.insert_formal_arg(1, arg("count", ArgType::Integer)).unwrap();
        let old = with_ids(old, &[10, 11]);

        let mut matrix = Matrix::new(&old);
        matrix.replace_arg(0, DataValue::nominal("left")).unwrap();
        matrix.replace_arg(1, DataValue::Integer(3)).unwrap();

        // Drop "hand", move "count" first, append a fresh slot.
        let mut new = old.clone();
        new.remove_formal_arg(0).unwrap();
        new.insert_formal_arg(1, arg("note", ArgType::Text)).unwrap();
        let new = with_ids(new, &[11, 12]);

        let reshaped = cascade_matrix(&old, &new, &matrix, &policy);
        assert_eq!(reshaped.len(), new.arity());
        assert_eq!(reshaped.values(), &[DataValue::Integer(3), DataValue::Undefined]);
        assert_eq!(reshaped.formal_args(), new.formal_args());
    }

    #[test]
    fn rebind_coerces_by_position() {
        let policy = CoercionPolicy::default();
        let mut source = VocabElement::new_predicate("look").unwrap();
        source.insert_formal_arg(0, arg("at", ArgType::Nominal)).unwrap();
        source.insert_formal_arg(1, arg("for", ArgType::Integer)).unwrap();
        let source = with_ids(source, &[20, 21]);

        let mut target = VocabElement::new_predicate("see").unwrap();
        target.insert_formal_arg(0, arg("what", ArgType::Text)).unwrap();
        let target = with_ids(target, &[30]);

        let mut matrix = Matrix::new(&source);
        matrix.replace_arg(0, DataValue::nominal("door")).unwrap();
        matrix.replace_arg(1, DataValue::Integer(2)).unwrap();

        let rebound = rebind_matrix(&matrix, &target, &policy);
        assert_eq!(rebound.vocab_id(), target.id());
        assert_eq!(rebound.values(), &[DataValue::text("door")]);
    }
}
