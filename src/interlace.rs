/// Builds the row visitation order for an interlaced image: four passes
/// over the rectangle's rows (0,8,16,...; 4,12,20,...; 2,6,10,...;
/// 1,3,5,...), concatenated. The teacher omits this entirely
/// (`Error::InterlacingNotSupported`); the specification requires it.
pub fn interlaced_row_order(height: u16) -> Vec<u16> {
    const PASSES: [(u16, u16); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];
    let mut rows = Vec::with_capacity(height as usize);
    for &(start, step) in &PASSES {
        let mut row = start;
        while row < height {
            rows.push(row);
            row += step;
        }
    }
    rows
}

/// Maps a linear pixel index (the order LZW decodes pixels in) to a row
/// within the frame rectangle, honoring interlace order when requested.
/// `non_interlaced` placement is the trivial `row = p / width`.
pub struct Placement {
    row_order: Option<Vec<u16>>,
    width: u16,
}

impl Placement {
    pub fn new(width: u16, height: u16, interlaced: bool) -> Self {
        Placement {
            row_order: interlaced.then(|| interlaced_row_order(height)),
            width,
        }
    }

    /// Convert a linear decode offset into (row, column) within the rect.
    pub fn locate(&self, linear_index: usize) -> (u16, u16) {
        let width = self.width as usize;
        let col = (linear_index % width) as u16;
        let logical_row = (linear_index / width) as u16;
        let row = match &self.row_order {
            Some(order) => order[logical_row as usize],
            None => logical_row,
        };
        (row, col)
    }
}
