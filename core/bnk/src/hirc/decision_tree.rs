//! Index-addressed decision trees used by music switches and dialogue events.
//!
//! On disk the tree is a flat array of 12-byte nodes:
//! `key: u32`, `peek: u32`, `weight: u16`, `probability: u16`.
//! For a branch, `peek` packs `first_child` (low 16 bits) and `child_count` (high 16 bits);
//! for a leaf it is the audio node id. Which of the two it is cannot be read from the node
//! itself, it is decided by [`is_leaf`] from the node's position in the tree.

use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::{Cursor, Read, Write};
use tracing::debug;
use utils::BinReadExt;

use crate::codec::{BinCodec, count_u32};
use crate::error::{BnkError, Result};

pub const NODE_SIZE: usize = 12;

const DEFAULT_WEIGHT: u16 = 50;
const DEFAULT_PROBABILITY: u16 = 100;

/// Leaf test applied to every node while walking the flat array.
pub fn is_leaf(idx: u32, cnt: u32, count_max: u32, depth: u32, max_depth: u32) -> bool {
    idx > count_max || cnt > count_max || depth == max_depth
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Audio { audio_node_id: u32 },
    Branch { first_child: u16, child_count: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionNode {
    pub key: u32,
    pub weight: u16,
    pub probability: u16,
    pub kind: NodeKind,
}

impl DecisionNode {
    pub fn is_audio(&self) -> bool {
        matches!(self.kind, NodeKind::Audio { .. })
    }
}

/// Arena of nodes in breadth-first order. `nodes[0]` is the root and every branch's
/// children occupy the contiguous range `first_child..first_child + child_count`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<DecisionNode>,
}

struct FlatNode {
    key: u32,
    peek: u32,
    weight: u16,
    probability: u16,
}

fn flat_node(data: &[u8], index: usize) -> Result<FlatNode> {
    let start = index * NODE_SIZE;
    let slice = data
        .get(start..start + NODE_SIZE)
        .ok_or_else(|| BnkError::OutOfRange(format!("decision tree node {} is out of bounds", index)))?;
    let mut cursor = Cursor::new(slice);
    Ok(FlatNode {
        key: cursor.read_u32::<LE>()?,
        peek: cursor.read_u32::<LE>()?,
        weight: cursor.read_u16::<LE>()?,
        probability: cursor.read_u16::<LE>()?,
    })
}

impl DecisionTree {
    /// Walk the flat node array breadth-first from node 0, bounded by `max_depth`.
    pub fn parse(data: &[u8], max_depth: u32) -> Result<Self> {
        if data.len() % NODE_SIZE != 0 {
            return Err(BnkError::ParseError(format!(
                "decision tree of {} bytes is not a whole number of nodes",
                data.len()
            )));
        }
        let count_max = data.len() / NODE_SIZE;
        if count_max == 0 {
            return Ok(DecisionTree::default());
        }
        let count_max_u32 = u32::try_from(count_max)
            .map_err(|_| BnkError::OutOfRange("decision tree too large".to_string()))?;

        let mut nodes = Vec::with_capacity(count_max);
        let mut queue = VecDeque::from([(0usize, 0u32)]);
        let mut next_index = 1usize;

        while let Some((file_index, depth)) = queue.pop_front() {
            let flat = flat_node(data, file_index)?;
            let idx = flat.peek & 0xFFFF;
            let cnt = flat.peek >> 16;

            let kind = if is_leaf(idx, cnt, count_max_u32, depth, max_depth) {
                NodeKind::Audio {
                    audio_node_id: flat.peek,
                }
            } else {
                if idx + cnt > count_max_u32 {
                    return Err(BnkError::OutOfRange(format!(
                        "children {}..{} exceed {} nodes",
                        idx,
                        idx + cnt,
                        count_max
                    )));
                }
                let first_child = next_index;
                next_index += cnt as usize;
                if next_index > count_max {
                    return Err(BnkError::ParseError(format!(
                        "decision tree expands past its {} stored nodes",
                        count_max
                    )));
                }
                for child in idx..idx + cnt {
                    queue.push_back((child as usize, depth + 1));
                }
                NodeKind::Branch {
                    first_child: first_child as u16,
                    child_count: cnt as u16,
                }
            };

            nodes.push(DecisionNode {
                key: flat.key,
                weight: flat.weight,
                probability: flat.probability,
                kind,
            });
        }

        Ok(DecisionTree { nodes })
    }

    /// Serialize in breadth-first order, recomputing every branch's child range.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.nodes.len() * NODE_SIZE);
        if self.nodes.is_empty() {
            return Ok(out);
        }

        let mut queue = VecDeque::from([0usize]);
        let mut next_out = 1usize;
        let mut emitted = 0usize;

        while let Some(index) = queue.pop_front() {
            emitted += 1;
            if emitted > self.nodes.len() {
                return Err(BnkError::ParseError(
                    "decision tree nodes are reachable more than once".to_string(),
                ));
            }
            let node = &self.nodes[index];
            let peek = match node.kind {
                NodeKind::Audio { audio_node_id } => audio_node_id,
                NodeKind::Branch {
                    first_child,
                    child_count,
                } => {
                    let start = first_child as usize;
                    let end = start + child_count as usize;
                    if end > self.nodes.len() {
                        return Err(BnkError::OutOfRange(format!(
                            "node {} points at children {}..{} of {}",
                            index,
                            start,
                            end,
                            self.nodes.len()
                        )));
                    }
                    let out_first = u16::try_from(next_out).map_err(|_| {
                        BnkError::OutOfRange("decision tree exceeds 65535 nodes".to_string())
                    })?;
                    next_out += child_count as usize;
                    queue.extend(start..end);
                    u32::from(out_first) | (u32::from(child_count) << 16)
                }
            };
            out.write_u32::<LE>(node.key)?;
            out.write_u32::<LE>(peek)?;
            out.write_u16::<LE>(node.weight)?;
            out.write_u16::<LE>(node.probability)?;
        }

        Ok(out)
    }

    pub fn root(&self) -> Option<&DecisionNode> {
        self.nodes.first()
    }

    pub fn children(&self, index: usize) -> &[DecisionNode] {
        match self.nodes.get(index).map(|n| &n.kind) {
            Some(NodeKind::Branch {
                first_child,
                child_count,
            }) => {
                let start = *first_child as usize;
                let end = start + *child_count as usize;
                self.nodes.get(start..end).unwrap_or(&[])
            }
            _ => &[],
        }
    }

    /// Audio node ids of every leaf, in breadth-first order.
    pub fn audio_node_ids(&self) -> Vec<u32> {
        self.nodes
            .iter()
            .filter_map(|n| match n.kind {
                NodeKind::Audio { audio_node_id } => Some(audio_node_id),
                NodeKind::Branch { .. } => None,
            })
            .collect()
    }

    pub fn from_root(root: BuildNode) -> Self {
        let mut nodes = Vec::new();
        let mut queue = VecDeque::from([root]);
        let mut next_index = 1usize;
        while let Some(node) = queue.pop_front() {
            let (key, weight, probability, kind) = match node {
                BuildNode::Audio {
                    key,
                    audio_node_id,
                    weight,
                    probability,
                } => (key, weight, probability, NodeKind::Audio { audio_node_id }),
                BuildNode::Branch {
                    key,
                    weight,
                    probability,
                    children,
                } => {
                    let kind = NodeKind::Branch {
                        first_child: next_index as u16,
                        child_count: children.len() as u16,
                    };
                    next_index += children.len();
                    queue.extend(children);
                    (key, weight, probability, kind)
                }
            };
            nodes.push(DecisionNode {
                key,
                weight,
                probability,
                kind,
            });
        }
        DecisionTree { nodes }
    }
}

/// Nested form used to assemble a tree by hand; flattened by [`DecisionTree::from_root`].
#[derive(Debug, Clone, PartialEq)]
pub enum BuildNode {
    Audio {
        key: u32,
        audio_node_id: u32,
        weight: u16,
        probability: u16,
    },
    Branch {
        key: u32,
        weight: u16,
        probability: u16,
        children: Vec<BuildNode>,
    },
}

impl BuildNode {
    pub fn audio(key: u32, audio_node_id: u32) -> Self {
        BuildNode::Audio {
            key,
            audio_node_id,
            weight: DEFAULT_WEIGHT,
            probability: DEFAULT_PROBABILITY,
        }
    }

    pub fn branch(key: u32, children: Vec<BuildNode>) -> Self {
        BuildNode::Branch {
            key,
            weight: DEFAULT_WEIGHT,
            probability: DEFAULT_PROBABILITY,
            children,
        }
    }
}

/// Tree payload. Trees that fail to decode, or that would not re-encode to the same
/// bytes, are carried as an opaque blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeData {
    Parsed(DecisionTree),
    Raw(#[serde(with = "crate::hex_serde")] Vec<u8>),
}

impl Default for TreeData {
    fn default() -> Self {
        TreeData::Parsed(DecisionTree::default())
    }
}

impl TreeData {
    pub fn decode(bytes: Vec<u8>, max_depth: u32) -> Self {
        match DecisionTree::parse(&bytes, max_depth) {
            Ok(tree) => match tree.to_bytes() {
                Ok(encoded) if encoded == bytes => TreeData::Parsed(tree),
                _ => {
                    debug!("decision tree does not re-encode identically, keeping raw bytes");
                    TreeData::Raw(bytes)
                }
            },
            Err(e) => {
                debug!("decision tree kept raw: {}", e);
                TreeData::Raw(bytes)
            }
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            TreeData::Parsed(tree) => tree.to_bytes(),
            TreeData::Raw(bytes) => Ok(bytes.clone()),
        }
    }

    pub fn tree(&self) -> Option<&DecisionTree> {
        match self {
            TreeData::Parsed(tree) => Some(tree),
            TreeData::Raw(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeArgument {
    pub group_id: u32,
    pub group_type: u8,
}

/// Argument list plus decision tree, shared by music switches and dialogue events.
/// On disk: depth, all group ids, all group types, tree size, mode, tree bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwitchTree {
    pub arguments: Vec<TreeArgument>,
    pub mode: u8,
    pub data: TreeData,
}

impl SwitchTree {
    pub fn audio_node_ids(&self) -> Vec<u32> {
        self.data
            .tree()
            .map(DecisionTree::audio_node_ids)
            .unwrap_or_default()
    }
}

impl BinCodec for SwitchTree {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let depth = reader.read_u32::<LE>()?;
        let mut arguments = Vec::with_capacity((depth as usize).min(64));
        for _ in 0..depth {
            arguments.push(TreeArgument {
                group_id: reader.read_u32::<LE>()?,
                group_type: 0,
            });
        }
        for argument in &mut arguments {
            argument.group_type = reader.read_u8()?;
        }
        let tree_size = reader.read_u32::<LE>()? as usize;
        let mode = reader.read_u8()?;
        let bytes = reader.read_bytes(tree_size)?;
        Ok(SwitchTree {
            arguments,
            mode,
            data: TreeData::decode(bytes, depth),
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LE>(count_u32(self.arguments.len(), "tree arguments")?)?;
        for argument in &self.arguments {
            writer.write_u32::<LE>(argument.group_id)?;
        }
        for argument in &self.arguments {
            writer.write_u8(argument.group_type)?;
        }
        let bytes = self.data.encode()?;
        writer.write_u32::<LE>(count_u32(bytes.len(), "decision tree")?)?;
        writer.write_u8(self.mode)?;
        writer.write_all(&bytes)?;
        Ok(())
    }
}
