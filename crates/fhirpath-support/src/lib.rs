//! # Arbor FHIRPath Support
//!
//! The contract between an external FHIRPath evaluator and the arbor node
//! tree. An evaluator never sees concrete node types; it walks a tree through
//! [`TypeAdapter`], asks nodes to convert themselves into System values, and
//! compares them with [`TypeAdapter::equal`] and [`TypeAdapter::equivalent`].
//!
//! Conversions return a [`Conversion<T>`]:
//!
//! ```
//! use arbor_fhirpath_support::SystemValue;
//!
//! let text = SystemValue::String("2015-02-07".to_string());
//! assert!(text.to_date(false).unwrap().is_none()); // not applicable implicitly
//! assert!(text.to_date(true).unwrap().is_some());
//! assert!(SystemValue::String("2015-13".to_string()).to_date(true).is_err());
//! ```

pub mod error;
pub mod temporal;
pub mod type_info;
pub mod value;

pub use error::{Conversion, ConversionError};
pub use temporal::{PartialDate, PartialDateTime, PartialTime};
pub use type_info::{ElementInfo, FHIR_NAMESPACE, SYSTEM_NAMESPACE, TypeInfo};
pub use value::{DEFAULT_UNIT, Quantity, SystemValue};

use rust_decimal::Decimal;

/// Capabilities every node exposes to a path evaluator.
///
/// Implementors provide traversal, their System projection and their type
/// descriptor; the conversion and comparison methods have defaults built on
/// those three.
pub trait TypeAdapter {
    /// Immediate children in declaration order, optionally restricted to the
    /// named elements. Repeated elements contribute one entry per item.
    fn children(&self, filter: Option<&[&str]>) -> Vec<&dyn TypeAdapter>;

    /// The System value this node projects to, if it has one.
    ///
    /// Complex nodes and primitives that carry only metadata return
    /// `Ok(None)`. A primitive whose stored text is not a valid literal of its
    /// type returns an error.
    fn system_value(&self) -> Result<Option<SystemValue>, ConversionError>;

    fn type_info(&self) -> TypeInfo;

    fn to_boolean(&self, explicit: bool) -> Conversion<bool> {
        convert(self.system_value(), |v| v.to_boolean(explicit))
    }

    fn to_system_string(&self, explicit: bool) -> Conversion<String> {
        convert(self.system_value(), |v| v.to_system_string(explicit))
    }

    fn to_integer(&self, explicit: bool) -> Conversion<i64> {
        convert(self.system_value(), |v| v.to_integer(explicit))
    }

    fn to_decimal(&self, explicit: bool) -> Conversion<Decimal> {
        convert(self.system_value(), |v| v.to_decimal(explicit))
    }

    fn to_date(&self, explicit: bool) -> Conversion<PartialDate> {
        convert(self.system_value(), |v| v.to_date(explicit))
    }

    fn to_time(&self, explicit: bool) -> Conversion<PartialTime> {
        convert(self.system_value(), |v| v.to_time(explicit))
    }

    fn to_date_time(&self, explicit: bool) -> Conversion<PartialDateTime> {
        convert(self.system_value(), |v| v.to_date_time(explicit))
    }

    fn to_quantity(&self, explicit: bool) -> Conversion<Quantity> {
        convert(self.system_value(), |v| v.to_quantity(explicit))
    }

    /// FHIRPath `=`. `None` means the operands are not comparable.
    ///
    /// Nodes with System values compare by value. Complex nodes compare
    /// element by element and are unequal when their types differ.
    fn equal(&self, other: &dyn TypeAdapter) -> Option<bool> {
        match (self.system_value(), other.system_value()) {
            (Ok(Some(left)), Ok(Some(right))) => left.equal(&right),
            (Ok(None), Ok(None)) => {
                let left_type = self.type_info();
                if left_type.qualified_name() != other.type_info().qualified_name() {
                    return Some(false);
                }
                let mut outcome = Some(true);
                for element in &left_type.elements {
                    let names = [element.name];
                    let left = self.children(Some(&names[..]));
                    let right = other.children(Some(&names[..]));
                    if left.len() != right.len() {
                        return Some(false);
                    }
                    for (l, r) in left.iter().zip(right.iter()) {
                        match l.equal(*r) {
                            Some(true) => {}
                            Some(false) => return Some(false),
                            None => outcome = None,
                        }
                    }
                }
                outcome
            }
            _ => None,
        }
    }

    /// FHIRPath `~`. Repeated elements are matched without regard to order.
    fn equivalent(&self, other: &dyn TypeAdapter) -> bool {
        match (self.system_value(), other.system_value()) {
            (Ok(Some(left)), Ok(Some(right))) => left.equivalent(&right),
            (Ok(None), Ok(None)) => {
                let left_type = self.type_info();
                if left_type.qualified_name() != other.type_info().qualified_name() {
                    return false;
                }
                left_type.elements.iter().all(|element| {
                    let names = [element.name];
                    let left = self.children(Some(&names[..]));
                    let mut right = other.children(Some(&names[..]));
                    if left.len() != right.len() {
                        return false;
                    }
                    left.iter().all(|l| {
                        match right.iter().position(|r| l.equivalent(*r)) {
                            Some(index) => {
                                right.swap_remove(index);
                                true
                            }
                            None => false,
                        }
                    })
                })
            }
            _ => false,
        }
    }
}

fn convert<T>(
    value: Result<Option<SystemValue>, ConversionError>,
    f: impl FnOnce(&SystemValue) -> Conversion<T>,
) -> Conversion<T> {
    match value? {
        Some(value) => f(&value),
        None => Ok(None),
    }
}

impl TypeAdapter for SystemValue {
    fn children(&self, _filter: Option<&[&str]>) -> Vec<&dyn TypeAdapter> {
        Vec::new()
    }

    fn system_value(&self) -> Result<Option<SystemValue>, ConversionError> {
        Ok(Some(self.clone()))
    }

    fn type_info(&self) -> TypeInfo {
        TypeInfo::system(self.type_name())
    }
}

/// Plain strings (element ids, extension urls) surface as `System.String`.
impl TypeAdapter for String {
    fn children(&self, _filter: Option<&[&str]>) -> Vec<&dyn TypeAdapter> {
        Vec::new()
    }

    fn system_value(&self) -> Result<Option<SystemValue>, ConversionError> {
        Ok(Some(SystemValue::String(self.clone())))
    }

    fn type_info(&self) -> TypeInfo {
        TypeInfo::system("String")
    }
}
