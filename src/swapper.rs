use std::mem;

/// A pair of buffers of the same type: read from `a`, write into `b`, then
/// `swap` so the freshly written buffer becomes the one that is read.
#[derive(Clone)]
pub struct Swapper<T> {
    a: T,
    b: T,
}

impl<T> Swapper<T> {
    pub fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    pub fn swap(&mut self) {
        mem::swap(&mut self.a, &mut self.b)
    }

    pub fn a(&self) -> &T {
        &self.a
    }

    pub fn mut_a(&mut self) -> &mut T {
        &mut self.a
    }

    pub fn read_a_write_b(&mut self) -> (&T, &mut T) {
        (&self.a, &mut self.b)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn swap_exposes_the_written_buffer() {
        let mut swapper = Swapper::new(vec![1, 2], vec![0, 0]);
        {
            let (read, write) = swapper.read_a_write_b();
            write
                .iter_mut()
                .zip(read.iter())
                .for_each(|(w, r)| *w = r * 10);
        }
        swapper.swap();

        assert_eq!(swapper.a(), &vec![10, 20]);
    }
}
