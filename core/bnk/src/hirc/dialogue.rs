use byteorder::{ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use super::HircItem;
use super::decision_tree::SwitchTree;
use crate::codec::BinCodec;
use crate::error::Result;
use crate::props::PropBundle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueEventValues {
    pub probability: u8,
    pub tree: SwitchTree,
    pub props: PropBundle,
    pub ranged_props: PropBundle,
}

impl Default for DialogueEventValues {
    fn default() -> Self {
        DialogueEventValues {
            probability: 100,
            tree: SwitchTree::default(),
            props: PropBundle::new(false),
            ranged_props: PropBundle::new(true),
        }
    }
}

impl BinCodec for DialogueEventValues {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(DialogueEventValues {
            probability: reader.read_u8()?,
            tree: SwitchTree::read(reader)?,
            props: PropBundle::read(reader, false)?,
            ranged_props: PropBundle::read(reader, true)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.probability)?;
        self.tree.write(writer)?;
        self.props.write(writer)?;
        self.ranged_props.write(writer)
    }
}

pub type DialogueEvent = HircItem<DialogueEventValues>;
