//! Pairwise comparison of slides through the language model.

use crate::llm::LlmClient;
use crate::types::SlideRecord;

/// Build the comparison prompt for two slides.
pub fn build_comparison_prompt(first: &SlideRecord, second: &SlideRecord) -> String {
    format!(
        r#"Here's a multi-slide presentation. Analyze the following information for factual or logical inconsistencies.
Slide {}: Text: {}
Slide {}: Text: {}

Provide a detailed, structured output referencing the slide numbers and the nature of each issue. Be thorough in your analysis, explaining the conflict, its impact, and the logical gaps. If no inconsistencies are found, state that clearly."#,
        first.slide_number,
        render_text(&first.text),
        second.slide_number,
        render_text(&second.text),
    )
}

/// Render slide text as a JSON string array, e.g. `["Title", "Body"]`.
fn render_text(text: &[String]) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("{:?}", text))
}

/// Iterator over every unordered index pair `(i, j)` with `i < j < n`,
/// in lexicographic order.
#[derive(Debug, Clone)]
pub struct SlidePairs {
    len: usize,
    i: usize,
    j: usize,
}

impl SlidePairs {
    pub fn new(len: usize) -> Self {
        Self { len, i: 0, j: 1 }
    }

    /// Number of pairs for `len` slides.
    pub fn count_for(len: usize) -> usize {
        len * len.saturating_sub(1) / 2
    }
}

impl Iterator for SlidePairs {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while self.i + 1 < self.len {
            if self.j < self.len {
                let pair = (self.i, self.j);
                self.j += 1;
                return Some(pair);
            }
            self.i += 1;
            self.j = self.i + 1;
        }
        None
    }
}

/// Compares every slide pair through an [`LlmClient`].
pub struct PairwiseAnalyzer<C> {
    client: C,
}

impl<C: LlmClient> PairwiseAnalyzer<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Compare two slides and return the raw finding.
    ///
    /// Model failures are not propagated: they become a finding text naming
    /// both slides and the cause. Nothing is retried.
    pub fn compare_pair(&self, first: &SlideRecord, second: &SlideRecord) -> String {
        let prompt = build_comparison_prompt(first, second);
        match self.client.generate(&prompt) {
            Ok(response) => response.trim().to_string(),
            Err(e) => {
                log::warn!(
                    "Model call failed for slides {} and {}: {}",
                    first.slide_number,
                    second.slide_number,
                    e
                );
                format!(
                    "Error analyzing slides {} and Slide {}: {}",
                    first.slide_number, second.slide_number, e
                )
            }
        }
    }

    /// Compare every slide pair in increasing `(i, j)` order.
    ///
    /// `progress` receives one message confirming extraction, then one
    /// message before each pair. Returns one raw finding per pair.
    pub fn analyze<F>(&self, slides: &[SlideRecord], mut progress: F) -> Vec<String>
    where
        F: FnMut(String),
    {
        progress(extraction_message(slides.len()));

        let mut run = PairwiseRun::new(slides.to_vec());
        while let Some(message) = run.step(self) {
            progress(message);
        }
        run.into_findings()
    }
}

/// Pair loop of one deck, advanced one step at a time.
///
/// Each [`step`](Self::step) first makes the model call for the pair
/// announced by the previous step, then announces the next pair. The
/// announcement therefore always precedes the call it names.
#[derive(Debug)]
pub struct PairwiseRun {
    slides: Vec<SlideRecord>,
    pairs: SlidePairs,
    pending: Option<(usize, usize)>,
    findings: Vec<String>,
}

impl PairwiseRun {
    pub fn new(slides: Vec<SlideRecord>) -> Self {
        let pairs = SlidePairs::new(slides.len());
        let findings = Vec::with_capacity(SlidePairs::count_for(slides.len()));
        Self {
            slides,
            pairs,
            pending: None,
            findings,
        }
    }

    /// Run the pending comparison, then return the progress message of the
    /// next pair, or `None` once every pair has been compared.
    pub fn step<C: LlmClient>(&mut self, analyzer: &PairwiseAnalyzer<C>) -> Option<String> {
        if let Some((i, j)) = self.pending.take() {
            let finding = analyzer.compare_pair(&self.slides[i], &self.slides[j]);
            self.findings.push(finding);
        }

        let (i, j) = self.pairs.next()?;
        self.pending = Some((i, j));
        Some(comparing_message(&self.slides[i], &self.slides[j]))
    }

    /// Raw findings collected so far, one per compared pair.
    pub fn into_findings(self) -> Vec<String> {
        self.findings
    }
}

pub(crate) fn extraction_message(slide_count: usize) -> String {
    format!("Content extracted from {} slides.", slide_count)
}

fn comparing_message(first: &SlideRecord, second: &SlideRecord) -> String {
    format!(
        "Comparing Slide {} and Slide {}...",
        first.slide_number, second.slide_number
    )
}
