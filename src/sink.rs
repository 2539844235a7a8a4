//! Stereo output sinks over caller-provided buffers.

/// Destination for rendered stereo frames.
pub trait StereoSink {
    /// Number of stereo frames the sink can hold.
    fn frames(&self) -> usize;

    /// Write one frame. `frame < self.frames()`.
    fn write_frame(&mut self, frame: usize, left: f32, right: f32);

    /// Silence the first `frames` frames.
    fn silence(&mut self, frames: usize);
}

/// Interleaved `[L, R, L, R, ...]` buffer, the layout cpal hands out.
pub struct Interleaved<'a> {
    data: &'a mut [f32],
}

impl<'a> Interleaved<'a> {
    /// A trailing sample that does not complete a frame is zeroed here and
    /// never written again.
    pub fn new(data: &'a mut [f32]) -> Self {
        if data.len() % 2 == 1 {
            if let Some(last) = data.last_mut() {
                *last = 0.0;
            }
        }
        Self { data }
    }
}

impl StereoSink for Interleaved<'_> {
    fn frames(&self) -> usize {
        self.data.len() / 2
    }

    #[inline]
    fn write_frame(&mut self, frame: usize, left: f32, right: f32) {
        let i = frame * 2;
        self.data[i] = left;
        self.data[i + 1] = right;
    }

    fn silence(&mut self, frames: usize) {
        let end = (frames * 2).min(self.data.len());
        self.data[..end].fill(0.0);
    }
}

/// One buffer per channel.
pub struct Planar<'a> {
    left: &'a mut [f32],
    right: &'a mut [f32],
}

impl<'a> Planar<'a> {
    pub fn new(left: &'a mut [f32], right: &'a mut [f32]) -> Self {
        Self { left, right }
    }
}

impl StereoSink for Planar<'_> {
    fn frames(&self) -> usize {
        self.left.len().min(self.right.len())
    }

    #[inline]
    fn write_frame(&mut self, frame: usize, left: f32, right: f32) {
        self.left[frame] = left;
        self.right[frame] = right;
    }

    fn silence(&mut self, frames: usize) {
        let left_end = frames.min(self.left.len());
        let right_end = frames.min(self.right.len());
        self.left[..left_end].fill(0.0);
        self.right[..right_end].fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_layout() {
        let mut buf = [9.0; 6];
        let mut sink = Interleaved::new(&mut buf);
        assert_eq!(sink.frames(), 3);
        sink.write_frame(1, 0.25, -0.25);
        sink.silence(1);
        assert_eq!(buf, [0.0, 0.0, 0.25, -0.25, 9.0, 9.0]);
    }

    #[test]
    fn odd_length_tail_is_zeroed() {
        let mut buf = [9.0; 5];
        let sink = Interleaved::new(&mut buf);
        assert_eq!(sink.frames(), 2);
        assert_eq!(buf, [9.0, 9.0, 9.0, 9.0, 0.0]);
    }

    #[test]
    fn planar_uses_shorter_channel() {
        let mut l = [1.0; 4];
        let mut r = [1.0; 3];
        let mut sink = Planar::new(&mut l, &mut r);
        assert_eq!(sink.frames(), 3);
        sink.write_frame(2, 0.5, -0.5);
        sink.silence(2);
        assert_eq!(l, [0.0, 0.0, 0.5, 1.0]);
        assert_eq!(r, [0.0, 0.0, -0.5]);
    }
}
