// THEORY:
// The `BlobAssembler` is the last stage of a call. It freezes the surviving
// regions into immutable `Blob`s, in the order the regions sit in the list,
// which is discovery order (the merger keeps the earlier slot on every union).
// No sort is applied.
//
// It is also where the optional post-merge size filter lives. The pre-merge
// filter always runs inside the extractor; the post-merge one only runs when a
// caller configures it, typically with larger minimums than the pre-merge pass.
//
// The output list is reserved fallibly, so an allocation failure here fails the
// whole call like any other scratch failure and no partial list is returned.

use crate::core_modules::blob::Blob;
use crate::core_modules::region::Region;
use crate::core_modules::size_filter::SizeFilter;
use crate::error::{BlobError, Result};
use std::mem::size_of;
use tracing::trace;

#[derive(Debug, Clone, Copy, Default)]
pub struct BlobAssembler {
    post_merge_filter: Option<SizeFilter>,
}

impl BlobAssembler {
    pub fn new(post_merge_filter: Option<SizeFilter>) -> Self {
        Self { post_merge_filter }
    }

    pub fn assemble(&self, regions: Vec<Region>) -> Result<Vec<Blob>> {
        let mut blobs = Vec::new();
        blobs
            .try_reserve_exact(regions.len())
            .map_err(|_| BlobError::out_of_memory("blob list", regions.len().saturating_mul(size_of::<Blob>())))?;

        for region in regions {
            if let Some(filter) = &self.post_merge_filter {
                if !filter.admits(&region) {
                    trace!(rect = %region.rect(), pixels = region.pixels(), "Blob rejected by post-merge filter");
                    continue;
                }
            }
            blobs.push(region.into_blob());
        }
        Ok(blobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::geometry::Rect;

    fn bar(x0: i32, len: i32) -> Region {
        let mut region = Region::seed(x0, 0, 1);
        for x in x0 + 1..x0 + len {
            region.add_pixel(x, 0, 1);
        }
        region
    }

    #[test]
    fn keeps_list_order() {
        let blobs = BlobAssembler::default()
            .assemble(vec![bar(10, 2), bar(0, 3)])
            .expect("assemble");
        let rects: Vec<Rect> = blobs.iter().map(Blob::rect).collect();
        assert_eq!(rects, vec![Rect::new(10, 0, 2, 1), Rect::new(0, 0, 3, 1)]);
    }

    #[test]
    fn post_merge_filter_drops_small_blobs() {
        let assembler = BlobAssembler::new(Some(SizeFilter::new(0, 3)));
        let blobs = assembler.assemble(vec![bar(10, 2), bar(0, 3)]).expect("assemble");
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].pixels(), 3);
    }
}
