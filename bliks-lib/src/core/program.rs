//! the resolved, executable form of a program
//!
//! A CompiledProgram is a pure value: instructions, a begin index, and
//! side-tables whose keys are strings or numbers and whose values are
//! strings, numbers or nested tables. Nothing in it refers to live state,
//! which is what makes it serializable and safe to share between machines.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

use crate::core::*;

const LABELS: &str = "labels";
const JUMP_DESTS: &str = "jumpDests";
const MACROS: &str = "macros";
const CUR_INSTRUCTION: &str = "curInstruction";
const IF_LEVEL: &str = "ifLevel";
const LOOP_LEVEL: &str = "loopLevel";

/// key of an auxiliary side-table: a string or a number.
///
/// Keys serialize as their string rendering; renderings that parse
/// numerically read back as numeric keys. The two spaces cannot collide
/// because label and macro names never start with a digit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum AuxKey {
    Num(OrderedFloat<f64>),
    Str(String),
}

impl From<&str> for AuxKey {
    fn from(s: &str) -> Self {
        AuxKey::Str(s.to_owned())
    }
}

impl From<i64> for AuxKey {
    fn from(n: i64) -> Self {
        AuxKey::Num(OrderedFloat(n as f64))
    }
}

impl Serialize for AuxKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AuxKey::Num(n) => serializer.serialize_str(&Value::Num(n.0).to_string()),
            AuxKey::Str(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for AuxKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(match s.parse::<f64>() {
            Ok(n) => AuxKey::Num(OrderedFloat(n)),
            Err(_) => AuxKey::Str(s),
        })
    }
}

/// value of an auxiliary side-table: strings, numbers or nested tables,
/// nothing else
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum AuxValue {
    Str(String),
    Num(f64),
    Table(AuxTable),
}

pub type AuxTable = BTreeMap<AuxKey, AuxValue>;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Value,
    Retrieval,
}

/// a resolved argument. For retrievals, `value` is the starting register
/// index and `depth` the number of hops; plain values keep depth 0
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Argument {
    pub kind: ArgKind,
    pub expected: ValueType,
    pub value: Value,
    pub depth: u32,
    pub pos: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Instruction {
    pub func: String,
    pub args: Vec<Argument>,
    /// 1-based index of this instruction in the program
    pub num: i64,
    pub pos: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CompiledProgram {
    pub instructions: Vec<Instruction>,
    /// 1-based index of the first instruction to execute. 0 while the
    /// resolver is still running and nothing set it
    pub begin: i64,
    /// side tables written by compile-time built-ins
    pub aux: AuxTable,
}

impl CompiledProgram {
    /// looks up an instruction by its 1-based index
    pub fn instruction(&self, num: i64) -> Option<&Instruction> {
        if num < 1 {
            return None;
        }
        self.instructions.get(num as usize - 1)
    }

    fn table(&self, key: &str) -> Option<&AuxTable> {
        match self.aux.get(&AuxKey::from(key)) {
            Some(AuxValue::Table(t)) => Some(t),
            _ => None,
        }
    }

    fn table_mut(&mut self, key: &str) -> &mut AuxTable {
        let entry = self
            .aux
            .entry(AuxKey::from(key))
            .or_insert_with(|| AuxValue::Table(AuxTable::new()));
        match entry {
            AuxValue::Table(t) => t,
            _ => panic!("aux entry '{key}' is not a table"),
        }
    }

    fn num_entry(&self, key: &str) -> Option<f64> {
        match self.aux.get(&AuxKey::from(key)) {
            Some(AuxValue::Num(n)) => Some(*n),
            _ => None,
        }
    }

    fn set_num_entry(&mut self, key: &str, value: f64) {
        self.aux.insert(AuxKey::from(key), AuxValue::Num(value));
    }

    /// the index the next emitted instruction will get; compile-time
    /// behaviors read this to place labels and jump destinations
    pub fn cur_instruction(&self) -> i64 {
        self.num_entry(CUR_INSTRUCTION).unwrap_or(0.0) as i64
    }

    pub(crate) fn set_cur_instruction(&mut self, num: i64) {
        self.set_num_entry(CUR_INSTRUCTION, num as f64);
    }

    pub fn if_level(&self) -> i64 {
        self.num_entry(IF_LEVEL).unwrap_or(0.0) as i64
    }

    pub fn set_if_level(&mut self, level: i64) {
        self.set_num_entry(IF_LEVEL, level as f64);
    }

    pub fn loop_level(&self) -> i64 {
        self.num_entry(LOOP_LEVEL).unwrap_or(0.0) as i64
    }

    pub fn set_loop_level(&mut self, level: i64) {
        self.set_num_entry(LOOP_LEVEL, level as f64);
    }

    pub fn macro_value(&self, name: &str) -> Option<Value> {
        match self.table(MACROS)?.get(&AuxKey::from(name))? {
            AuxValue::Str(s) => Some(Value::Str(s.clone())),
            AuxValue::Num(n) => Some(Value::Num(*n)),
            AuxValue::Table(_) => None,
        }
    }

    pub fn set_macro(&mut self, name: &str, value: &Value) {
        let entry = match value {
            Value::Str(s) => AuxValue::Str(s.clone()),
            Value::Num(n) => AuxValue::Num(*n),
        };
        self.table_mut(MACROS).insert(AuxKey::from(name), entry);
    }

    /// appends an instruction index to a label's occurrence list
    pub fn push_label(&mut self, name: &str, num: i64) {
        let labels = self.table_mut(LABELS);
        let list = match labels
            .entry(AuxKey::from(name))
            .or_insert_with(|| AuxValue::Table(AuxTable::new()))
        {
            AuxValue::Table(t) => t,
            _ => panic!("label entry '{name}' is not a table"),
        };
        let next = list.len() as i64 + 1;
        list.insert(AuxKey::from(next), AuxValue::Num(num as f64));
    }

    pub fn label_exists(&self, name: &str) -> bool {
        self.table(LABELS)
            .is_some_and(|t| t.contains_key(&AuxKey::from(name)))
    }

    /// the label's instruction indices in the order they were recorded
    pub fn label_indices(&self, name: &str) -> Option<Vec<i64>> {
        let list = match self.table(LABELS)?.get(&AuxKey::from(name))? {
            AuxValue::Table(t) => t,
            _ => return None,
        };
        Some(
            list.values()
                .filter_map(|v| match v {
                    AuxValue::Num(n) => Some(*n as i64),
                    _ => None,
                })
                .collect(),
        )
    }

    /// associates a run-time instruction with the label it targets
    pub fn set_jump_dest(&mut self, num: i64, label: &str) {
        self.table_mut(JUMP_DESTS)
            .insert(AuxKey::from(num), AuxValue::Str(label.to_owned()));
    }

    pub fn jump_dest(&self, num: i64) -> Option<&str> {
        match self.table(JUMP_DESTS)?.get(&AuxKey::from(num))? {
            AuxValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// removes the keys that only exist while the resolver runs
    pub(crate) fn strip_temp_keys(&mut self) {
        for key in [MACROS, CUR_INSTRUCTION, IF_LEVEL, LOOP_LEVEL] {
            self.aux.remove(&AuxKey::from(key));
        }
    }
}
