use super::slot::Target;
use super::tag::Tags;
use crate::validation::Inspect;

/// A struct whose fields can be filled from request parameters.
///
/// Usually implemented with `#[derive(Bind)]`, which lists every tagged
/// field in declaration order together with its static tag table.
pub trait Bindable {
    /// Name used in binding and validation errors.
    fn type_name(&self) -> &'static str;

    /// Writable descriptors for parameter fields and embedded structs.
    ///
    /// Embedded `Option` structs are allocated by this call.
    fn fields_mut(&mut self) -> Vec<FieldMut<'_>>;

    /// Read-only descriptors for fields carrying a `validate` tag and for
    /// embedded structs.
    fn fields(&self) -> Vec<FieldRef<'_>>;
}

/// Mutable view of one field.
pub enum FieldMut<'a> {
    Param {
        name: &'static str,
        tags: Tags,
        target: Box<dyn Target + 'a>,
    },
    Embedded(&'a mut dyn Bindable),
}

/// Read-only view of one field.
pub enum FieldRef<'a> {
    Value {
        name: &'static str,
        tags: Tags,
        value: &'a dyn Inspect,
    },
    /// `None` for an embedded `Option` that was never allocated.
    Embedded(Option<&'a dyn Bindable>),
}

impl<T: Bindable + ?Sized> Bindable for Box<T> {
    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }

    fn fields_mut(&mut self) -> Vec<FieldMut<'_>> {
        (**self).fields_mut()
    }

    fn fields(&self) -> Vec<FieldRef<'_>> {
        (**self).fields()
    }
}
