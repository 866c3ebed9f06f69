use std::io::{Read, Write};
use log::info;
use serde::{Deserialize, Serialize};
use crate::error::Error;
use crate::index::LayoutIndex;
use crate::index_space::IndexSpace;
use crate::layout_data::{BoxLayoutData, PatchData};
use crate::linear::{self, Linearize};




#[derive(Serialize, Deserialize)]
struct Checkpoint {
    boxes: Vec<IndexSpace>,
    num_comps: usize,
    patches: Vec<Patch>,
}

#[derive(Serialize, Deserialize)]
struct Patch {
    position: usize,
    bytes: Vec<u8>,
}




/**
 * Write the locally-owned part of a level to a CBOR stream: the boxes of
 * its layout, its component count, and the linearized payload of each
 * local patch over the payload's full region.
 */
pub fn write_level<T, W>(level: &BoxLayoutData<T>, writer: W) -> Result<(), Error>
where
    T: PatchData + Linearize,
    W: Write,
{
    let comps = 0..level.num_comps();
    let patches: Vec<Patch> = level
        .iter()
        .map(|(index, item)| Patch {
            position: LayoutIndex::from(index).int_code(),
            bytes: linear::pack(item, item.region(), comps.clone()),
        })
        .collect();

    let checkpoint = Checkpoint {
        boxes: level.layout().boxes().to_vec(),
        num_comps: level.num_comps(),
        patches,
    };
    ciborium::ser::into_writer(&checkpoint, writer).map_err(|e| Error::Encode(format!("{:?}", e)))?;

    info!("wrote checkpoint of {} local patches", checkpoint.patches.len());
    Ok(())
}




/**
 * Restore a level from a CBOR stream written by `write_level`. The level
 * must already be defined on a layout with the same boxes and the same
 * number of components, and must own every patch in the stream.
 */
pub fn read_level<T, R>(level: &mut BoxLayoutData<T>, reader: R) -> Result<(), Error>
where
    T: PatchData + Linearize,
    R: Read,
{
    let checkpoint: Checkpoint = ciborium::de::from_reader(reader).map_err(|e| Error::Decode(format!("{:?}", e)))?;
    let layout = level.layout().clone();

    if checkpoint.boxes != layout.boxes() {
        return Err(Error::LayoutMismatch { expected: layout.len(), found: checkpoint.boxes.len() })
    }
    if checkpoint.num_comps != level.num_comps() {
        return Err(Error::ComponentMismatch { expected: level.num_comps(), found: checkpoint.num_comps })
    }

    let comps = 0..level.num_comps();

    for patch in &checkpoint.patches {
        let index = layout
            .index_at(patch.position)
            .and_then(|index| layout.data_index(index))
            .ok_or(Error::PatchNotLocal(patch.position))?;

        let item = level.get_mut(index);
        let region = item.region().clone();
        let expected = item.linear_size(&region, comps.clone());

        if expected != patch.bytes.len() {
            return Err(Error::BufferSize { position: patch.position, expected, found: patch.bytes.len() })
        }
        linear::unpack(item, &patch.bytes, &region, comps.clone());
    }

    info!("read checkpoint of {} local patches", checkpoint.patches.len());
    Ok(())
}
