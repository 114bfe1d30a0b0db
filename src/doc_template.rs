use crate::canvas::{Canvas, Document};
use crate::debug::{DebugLogger, json_escape};
use crate::doc_context::DocContext;
use crate::error::LedgerPressError;
use crate::flowable::{BreakAfter, BreakBefore, Flowable};
use crate::frame::AddResult;
use crate::metrics::{DocumentMetrics, PageMetrics};
use crate::page_template::PageTemplate;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

pub struct DocTemplate {
    page_templates: Vec<PageTemplate>,
    story: Vec<Box<dyn Flowable>>,
    debug: Option<Arc<DebugLogger>>,
}

impl DocTemplate {
    pub fn new(page_templates: Vec<PageTemplate>) -> Self {
        Self {
            page_templates,
            story: Vec::new(),
            debug: None,
        }
    }

    pub(crate) fn with_debug(mut self, debug: Arc<DebugLogger>) -> Self {
        self.debug = Some(debug);
        self
    }

    pub fn add_flowable(&mut self, flowable: Box<dyn Flowable>) {
        self.story.push(flowable);
    }

    pub fn build(self) -> Result<Document, LedgerPressError> {
        Ok(self.build_with_metrics()?.0)
    }

    pub fn build_with_metrics(self) -> Result<(Document, DocumentMetrics), LedgerPressError> {
        if self.page_templates.is_empty() {
            return Err(LedgerPressError::MissingPageTemplate);
        }

        let debug = self.debug.clone();
        let log_page_break =
            |from_page: usize, to_page: usize, reason: &str, flowable_name: &str| {
                let Some(logger) = debug.as_deref() else {
                    return;
                };
                let json = format!(
                    "{{\"type\":\"layout.page_break\",\"reason\":\"{}\",\"from_page\":{},\"to_page\":{},\"flowable\":\"{}\"}}",
                    reason,
                    from_page,
                    to_page,
                    json_escape(flowable_name)
                );
                logger.log_json(&json);
                logger.increment("layout.page_break", 1);
            };

        fn select_template<'a>(
            page_templates: &'a [PageTemplate],
            page_number: usize,
        ) -> &'a PageTemplate {
            // page 1 -> templates[0], page n -> templates[min(n-1, len-1)];
            // the last template repeats for the remainder of the document.
            let idx = page_number.saturating_sub(1);
            let idx = idx.min(page_templates.len() - 1);
            &page_templates[idx]
        }

        let template = select_template(&self.page_templates, 1);
        let mut canvas = Canvas::new(template.page_size);
        let mut page_number = 1usize;
        let mut frames = template.instantiate_frames();
        let mut frame_index = 0usize;
        let mut placed_on_page = false;
        let mut metrics = DocumentMetrics::default();
        let mut page_start = Instant::now();
        let mut page_flowables = 0usize;

        let finish_page = |canvas: &mut Canvas,
                           page_number: usize,
                           page_flowables: &mut usize,
                           metrics: &mut DocumentMetrics,
                           page_start: &mut Instant| {
            if canvas.is_current_empty() {
                return;
            }
            let elapsed = page_start.elapsed().as_secs_f64() * 1000.0;
            metrics.total_render_ms += elapsed;
            metrics.pages.push(PageMetrics {
                page_number,
                render_ms: elapsed,
                command_count: canvas.current_command_count(),
                flowable_count: *page_flowables,
                content_bytes: 0,
            });
            canvas.show_page();
            *page_flowables = 0;
            *page_start = Instant::now();
        };

        if let Some(callback) = template.on_page() {
            callback(&mut canvas, &DocContext::new(page_number, &template.name));
        }

        let mut story: VecDeque<Box<dyn Flowable>> = self.story.into_iter().collect();
        while let Some(flowable) = story.pop_front() {
            let mut current = flowable;
            let mut suppress_break_before = false;
            loop {
                let current_name = current.debug_name();
                let pagination = current.pagination();
                let wants_new_page = !suppress_break_before
                    && matches!(pagination.break_before, BreakBefore::Page)
                    && (placed_on_page || frame_index > 0);
                if wants_new_page || frame_index >= frames.len() {
                    let reason = if wants_new_page {
                        "break_before_page"
                    } else {
                        "frame_exhausted"
                    };
                    log_page_break(page_number, page_number + 1, reason, current_name);
                    finish_page(
                        &mut canvas,
                        page_number,
                        &mut page_flowables,
                        &mut metrics,
                        &mut page_start,
                    );
                    page_number += 1;
                    let template = select_template(&self.page_templates, page_number);
                    frames = template.instantiate_frames();
                    frame_index = 0;
                    placed_on_page = false;
                    if let Some(callback) = template.on_page() {
                        callback(&mut canvas, &DocContext::new(page_number, &template.name));
                    }
                }

                if frames.is_empty() {
                    return Err(LedgerPressError::MissingPageTemplate);
                }

                let is_last_frame = frame_index + 1 >= frames.len();
                let frame_rect = frames[frame_index].rect();
                let unplaceable_details = if !placed_on_page && is_last_frame {
                    let size = current.wrap(frame_rect.width, frame_rect.height);
                    Some(format!(
                        "{} size={}x{}pt frame={}x{}pt",
                        current_name,
                        size.width.to_f32(),
                        size.height.to_f32(),
                        frame_rect.width.to_f32(),
                        frame_rect.height.to_f32(),
                    ))
                } else {
                    None
                };

                let frame = &mut frames[frame_index];
                match frame.add(current, &mut canvas) {
                    AddResult::Placed => {
                        placed_on_page = true;
                        page_flowables += 1;
                        if matches!(pagination.break_after, BreakAfter::Page) {
                            log_page_break(
                                page_number,
                                page_number + 1,
                                "break_after_page",
                                current_name,
                            );
                            finish_page(
                                &mut canvas,
                                page_number,
                                &mut page_flowables,
                                &mut metrics,
                                &mut page_start,
                            );
                            page_number += 1;
                            let template = select_template(&self.page_templates, page_number);
                            frames = template.instantiate_frames();
                            frame_index = 0;
                            placed_on_page = false;
                            if let Some(callback) = template.on_page() {
                                callback(
                                    &mut canvas,
                                    &DocContext::new(page_number, &template.name),
                                );
                            }
                        }
                        break;
                    }
                    AddResult::Split(remaining) => {
                        placed_on_page = true;
                        page_flowables += 1;
                        log_page_break(
                            page_number,
                            page_number + usize::from(is_last_frame),
                            "flowable_split",
                            current_name,
                        );
                        suppress_break_before = true;
                        current = remaining;
                        frame_index += 1;
                    }
                    AddResult::Overflow(remaining) => {
                        log_page_break(
                            page_number,
                            page_number + usize::from(is_last_frame),
                            "frame_overflow",
                            current_name,
                        );
                        if !placed_on_page && is_last_frame {
                            let details =
                                unplaceable_details.unwrap_or_else(|| "unknown".to_string());
                            return Err(LedgerPressError::UnplaceableFlowable(details));
                        }
                        current = remaining;
                        frame_index += 1;
                    }
                }
            }
        }

        if !canvas.is_current_empty() || metrics.pages.is_empty() {
            finish_page(
                &mut canvas,
                page_number,
                &mut page_flowables,
                &mut metrics,
                &mut page_start,
            );
        }

        // finish() also covers the degenerate empty-story case by emitting a
        // single blank page.
        Ok((canvas.finish(), metrics))
    }
}
