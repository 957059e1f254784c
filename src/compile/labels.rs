use std::collections::HashMap;

use crate::ir::Label;

use super::method_writer::{LabelHandle, MethodWriter};
use super::CompileError;

/// Maps IR labels to writer handles. Every label is created up front so
/// forward jumps resolve without a second pass.
#[derive(Debug, Default)]
pub struct LabelResolver {
    index: HashMap<Label, LabelHandle>,
}

impl LabelResolver {
    pub fn new(labels: &[Label], writer: &mut MethodWriter) -> Self {
        let mut index = HashMap::with_capacity(labels.len());
        for &label in labels {
            index
                .entry(label)
                .or_insert_with(|| writer.new_label(label.0));
        }
        LabelResolver { index }
    }

    pub fn resolve(&self, label: Label) -> Result<LabelHandle, CompileError> {
        self.index
            .get(&label)
            .copied()
            .ok_or(CompileError::UnknownLabel { label: label.0 })
    }
}
