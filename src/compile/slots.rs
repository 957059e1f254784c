use std::collections::HashMap;

use crate::ir::{Local, TypeDescriptor};

use super::CompileError;

/// Assigns local variable slots in first-encounter order. `long` and
/// `double` take two consecutive slots; slots are never reused.
#[derive(Debug, Default)]
pub struct SlotAllocator {
    index: HashMap<String, u16>,
    /// Insertion order, for the LocalVariableTable and frame layout.
    order: Vec<(Local, u16)>,
    next: u16,
}

impl SlotAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, local: &Local) -> Result<u16, CompileError> {
        if self.index.contains_key(&local.name) {
            return Err(CompileError::DuplicateLocal {
                name: local.name.clone(),
            });
        }
        let slot = self.next;
        let width = local.ty.slot_width().max(1);
        self.next = slot
            .checked_add(width)
            .ok_or(CompileError::LimitExceeded { what: "local slots" })?;
        self.index.insert(local.name.clone(), slot);
        self.order.push((local.clone(), slot));
        Ok(slot)
    }

    pub fn lookup(&self, local: &Local) -> Result<u16, CompileError> {
        self.index
            .get(&local.name)
            .copied()
            .ok_or_else(|| CompileError::UnknownLocal {
                name: local.name.clone(),
            })
    }

    /// Slot for an assignment target, allocating it on first sight.
    pub fn slot_for_store(&mut self, local: &Local) -> Result<u16, CompileError> {
        match self.index.get(&local.name) {
            Some(&slot) => Ok(slot),
            None => self.allocate(local),
        }
    }

    pub fn max_locals(&self) -> u16 {
        self.next
    }

    pub fn locals(&self) -> &[(Local, u16)] {
        &self.order
    }
}
