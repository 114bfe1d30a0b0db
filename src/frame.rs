use crate::canvas::Canvas;
use crate::flowable::{BreakInside, Flowable};
use crate::types::{Pt, Rect};

pub enum AddResult {
    Placed,
    Split(Box<dyn Flowable>),
    Overflow(Box<dyn Flowable>),
}

pub struct Frame {
    rect: Rect,
    cursor_y: Pt,
}

impl Frame {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            cursor_y: Pt::ZERO,
        }
    }

    pub fn remaining_height(&self) -> Pt {
        (self.rect.height - self.cursor_y).max(Pt::ZERO)
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn is_empty(&self) -> bool {
        self.cursor_y <= Pt::ZERO
    }

    pub fn add(&mut self, flowable: Box<dyn Flowable>, canvas: &mut Canvas) -> AddResult {
        let avail_width = self.rect.width;
        let avail_height = self.remaining_height();
        if avail_height <= Pt::ZERO {
            return AddResult::Overflow(flowable);
        }

        let pagination = flowable.pagination();
        let size = flowable.wrap(avail_width, avail_height);
        if matches!(pagination.break_inside, BreakInside::Avoid)
            && size.height > avail_height
            && size.height <= self.rect.height
            && !self.is_empty()
        {
            return AddResult::Overflow(flowable);
        }

        if size.height <= avail_height {
            flowable.draw(
                canvas,
                self.rect.x,
                self.rect.y + self.cursor_y,
                avail_width,
                avail_height,
            );
            self.cursor_y += size.height;
            return AddResult::Placed;
        }

        if let Some((first, second)) = flowable.split(avail_width, avail_height) {
            let first_size = first.wrap(avail_width, avail_height);
            if first_size.height > Pt::ZERO && first_size.height <= avail_height {
                first.draw(
                    canvas,
                    self.rect.x,
                    self.rect.y + self.cursor_y,
                    avail_width,
                    avail_height,
                );
                self.cursor_y += first_size.height;
                return AddResult::Split(second);
            }
        }

        // A flowable taller than a whole empty frame cannot be split further;
        // place it anyway so pagination keeps moving forward. Cell drawing
        // clips content that falls outside its bounds.
        if self.is_empty() {
            flowable.draw(
                canvas,
                self.rect.x,
                self.rect.y + self.cursor_y,
                avail_width,
                avail_height,
            );
            self.cursor_y = self.rect.height;
            return AddResult::Placed;
        }

        AddResult::Overflow(flowable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flowable::Spacer;
    use crate::types::Size;

    fn frame() -> Frame {
        Frame::new(Rect {
            x: Pt::from_f32(40.0),
            y: Pt::from_f32(140.0),
            width: Pt::from_f32(515.0),
            height: Pt::from_f32(600.0),
        })
    }

    #[test]
    fn placed_flowables_advance_the_cursor() {
        let mut frame = frame();
        let mut canvas = Canvas::new(Size::a4());
        assert!(matches!(
            frame.add(Box::new(Spacer::new(100.0)), &mut canvas),
            AddResult::Placed
        ));
        assert_eq!(frame.remaining_height(), Pt::from_f32(500.0));
        assert!(!frame.is_empty());
    }

    #[test]
    fn full_frame_overflows_further_content() {
        let mut frame = frame();
        let mut canvas = Canvas::new(Size::a4());
        assert!(matches!(
            frame.add(Box::new(Spacer::new(600.0)), &mut canvas),
            AddResult::Placed
        ));
        assert!(matches!(
            frame.add(Box::new(Spacer::new(1.0)), &mut canvas),
            AddResult::Overflow(_)
        ));
    }
}
