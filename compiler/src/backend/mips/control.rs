// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use log::trace;

use crate::{
    backend::{temp_immediate, ArchOpcode, FlagsCondition, FlagsContinuation, InstructionSelector, SwitchInfo},
    ir::{BlockId, NodeId},
    SelectionError,
};

impl InstructionSelector<'_> {
    pub(crate) fn visit_branch(&mut self, branch: NodeId, if_true: BlockId, if_false: BlockId) -> Result<(), SelectionError> {
        let mut cont = FlagsContinuation::for_branch(FlagsCondition::NotEqual, if_true, if_false);
        self.visit_word_compare_zero(branch, self.input_at(branch, 0), &mut cont)
    }

    /// Picks a jump table when it is not much larger than a chain of
    /// compares; time is weighed three times as heavy as space.
    pub(crate) fn visit_switch(&mut self, value: NodeId, info: &SwitchInfo) -> Result<(), SelectionError> {
        let value_operand = self.use_register(value);

        let table_space_cost = 9 + info.value_range;
        let table_time_cost = 3;
        let lookup_space_cost = 2 + 2 * info.case_count();
        let lookup_time_cost = info.case_count();

        if info.case_count() > 0
            && table_space_cost + 3 * table_time_cost <= lookup_space_cost + 3 * lookup_time_cost
            && info.min_value > i32::MIN
        {
            trace!("Switch met {} gevallen wordt een sprongtabel", info.case_count());

            let index_operand = if info.min_value == 0 {
                value_operand
            } else {
                let index = self.temp_register();
                self.emit(ArchOpcode::MipsSub, &[index], &[value_operand, temp_immediate(info.min_value)], &[])?;
                index
            };

            return self.emit_table_switch(info, index_operand);
        }

        self.emit_lookup_switch(info, value_operand)
    }
}
