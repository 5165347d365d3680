use super::SentenceAlignment;

/// A consistent source/target span pair within one sentence. All bounds are
/// inclusive and sentence-local.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhrasePair {
    pub sentence: usize,
    pub start_source: usize,
    pub end_source: usize,
    pub start_target: usize,
    pub end_target: usize,
}

impl PhrasePair {
    pub fn target_len(&self) -> usize {
        self.end_target - self.start_target + 1
    }
}

impl SentenceAlignment {
    /// Finds every target span consistent with the source span
    /// `[start_source, end_source]`.
    ///
    /// The tightest target span covering the source span's alignment points
    /// is emitted first, followed by every widening over unaligned target
    /// words on either side, none wider than `max_phrase_length`. Nothing is
    /// emitted if the source span is unaligned, if the tightest span is
    /// already too wide, or if any target word inside it is also aligned to a
    /// source word outside the source span.
    pub fn extract(
        &self,
        max_phrase_length: usize,
        start_source: usize,
        end_source: usize,
    ) -> Vec<PhrasePair> {
        if max_phrase_length == 0 || start_source > end_source || end_source >= self.source_len()
        {
            return Vec::new();
        }

        // Alignment points per target word that originate outside the span.
        let mut outside = self.aligned_count_trg.clone();
        let mut bounds: Option<(usize, usize)> = None;
        for targets in &self.aligned_src[start_source..=end_source] {
            for &t in targets {
                bounds = Some(match bounds {
                    Some((lo, hi)) => (lo.min(t), hi.max(t)),
                    None => (t, t),
                });
                outside[t] -= 1;
            }
        }

        let Some((min_target, max_target)) = bounds else {
            return Vec::new();
        };
        if max_target - min_target >= max_phrase_length {
            return Vec::new();
        }
        if outside[min_target..=max_target].iter().any(|&n| n > 0) {
            return Vec::new();
        }

        let unaligned = |t: usize| self.aligned_count_trg[t] == 0;
        let target_len = self.target_len();
        let mut pairs = Vec::new();

        let mut start_target = min_target;
        loop {
            let mut end_target = max_target;
            while end_target < target_len
                && end_target - start_target < max_phrase_length
                && (end_target == max_target || unaligned(end_target))
            {
                pairs.push(PhrasePair {
                    sentence: self.sentence,
                    start_source,
                    end_source,
                    start_target,
                    end_target,
                });
                end_target += 1;
            }

            if start_target == 0 {
                break;
            }
            start_target -= 1;
            if max_target - start_target >= max_phrase_length || !unaligned(start_target) {
                break;
            }
        }

        pairs
    }
}
