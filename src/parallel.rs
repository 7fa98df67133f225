//! Disjoint-chunk parallel passes over dense per-region and per-triangle arrays.
//!
//! Each worker owns one contiguous slice of the output and only reads shared state,
//! so results are identical to a sequential loop regardless of thread count.

use rayon::prelude::*;

/// Elements handed to one worker at a time.
pub const CHUNK_SIZE: usize = 1024;

/// Rewrite every element in place; `f` receives the global index.
pub fn update_chunks<T, F>(data: &mut [T], f: F)
where
    T: Send,
    F: Fn(usize, &mut T) + Sync + Send,
{
    data.par_chunks_mut(CHUNK_SIZE)
        .enumerate()
        .for_each(|(chunk, slice)| {
            let base = chunk * CHUNK_SIZE;
            for (offset, value) in slice.iter_mut().enumerate() {
                f(base + offset, value);
            }
        });
}

/// Build a dense array of `len` elements, computing each from its index.
pub fn map_chunks<T, F>(len: usize, f: F) -> Vec<T>
where
    T: Send + Clone + Default,
    F: Fn(usize) -> T + Sync + Send,
{
    let mut out = vec![T::default(); len];
    update_chunks(&mut out, |i, slot| *slot = f(i));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_span_chunk_boundaries() {
        let len = CHUNK_SIZE * 3 + 17;
        let out = map_chunks(len, |i| i);
        assert_eq!(out, (0..len).collect::<Vec<_>>());
    }

    #[test]
    fn test_update_in_place() {
        let mut data = vec![1.0f32; 2500];
        update_chunks(&mut data, |i, x| *x += i as f32);
        assert_eq!(data[0], 1.0);
        assert_eq!(data[2499], 2500.0);
    }
}
