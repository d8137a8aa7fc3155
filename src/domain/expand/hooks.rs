// Extension points fired around each step of template expansion

use serde_json::Value;

use super::writer::JsonWriter;
use crate::domain::parameter::ParameterCollection;
use crate::error::Result;

/// Callbacks around the expansion walk. Every method defaults to a no-op.
///
/// `property` is the name the object or array is written under, or `None`
/// for array elements and the document root.
#[allow(unused_variables)]
pub trait ExpandHooks {
    fn before_start_object(
        &mut self,
        writer: &mut JsonWriter,
        property: Option<&str>,
        ctx: &ParameterCollection,
    ) -> Result<()> {
        Ok(())
    }

    fn after_start_object(
        &mut self,
        writer: &mut JsonWriter,
        property: Option<&str>,
        ctx: &ParameterCollection,
    ) -> Result<()> {
        Ok(())
    }

    fn before_end_object(
        &mut self,
        writer: &mut JsonWriter,
        property: Option<&str>,
        ctx: &ParameterCollection,
    ) -> Result<()> {
        Ok(())
    }

    fn after_end_object(
        &mut self,
        writer: &mut JsonWriter,
        property: Option<&str>,
        ctx: &ParameterCollection,
    ) -> Result<()> {
        Ok(())
    }

    fn before_start_array(
        &mut self,
        writer: &mut JsonWriter,
        property: Option<&str>,
        ctx: &ParameterCollection,
    ) -> Result<()> {
        Ok(())
    }

    fn after_start_array(
        &mut self,
        writer: &mut JsonWriter,
        property: Option<&str>,
        ctx: &ParameterCollection,
    ) -> Result<()> {
        Ok(())
    }

    fn before_end_array(
        &mut self,
        writer: &mut JsonWriter,
        property: Option<&str>,
        ctx: &ParameterCollection,
    ) -> Result<()> {
        Ok(())
    }

    fn after_end_array(
        &mut self,
        writer: &mut JsonWriter,
        property: Option<&str>,
        ctx: &ParameterCollection,
    ) -> Result<()> {
        Ok(())
    }

    /// Called before a scalar property is written. Returning `true` means
    /// the hook handled it and the default write is skipped.
    fn before_property(
        &mut self,
        writer: &mut JsonWriter,
        name: &str,
        template: &Value,
        ctx: &ParameterCollection,
    ) -> Result<bool> {
        Ok(false)
    }

    fn after_property(
        &mut self,
        writer: &mut JsonWriter,
        name: &str,
        template: &Value,
        ctx: &ParameterCollection,
    ) -> Result<()> {
        Ok(())
    }
}

/// Plain expansion
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl ExpandHooks for NoHooks {}
