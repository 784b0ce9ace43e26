use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::labels::{GraphType, CLASSES};

/// Everything the classifier says about one image.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction
{
    /// Classes whose score cleared the acceptance threshold, in class table order.
    pub labels: Vec<GraphType>,
    /// One score per class, indexed like `classes`.
    pub scores: Vec<f32>,
    /// Mapping from score index to label.
    pub classes: &'static [GraphType],
}

impl RawPrediction
{
    /// Builds a prediction from per-class scores, accepting every class whose
    /// score is strictly greater than `threshold`.
    pub fn from_scores(scores: Vec<f32>, threshold: f32) -> Self
    {
        let labels = CLASSES
            .iter()
            .zip(scores.iter())
            .filter(|(_, score)| **score > threshold)
            .map(|(class, _)| *class)
            .collect();

        RawPrediction { labels, scores, classes: &CLASSES }
    }

    /// The class with the highest score. Ties go to the lowest index and NaN never wins.
    pub fn top_class(&self) -> Option<GraphType>
    {
        let mut best: Option<(usize, f32)> = None;
        for (index, score) in self.scores.iter().copied().enumerate()
        {
            if score.is_nan() {
                continue;
            }
            match best
            {
                Some((_, best_score)) if score <= best_score => {},
                _ => best = Some((index, score)),
            }
        }
        best.and_then(|(index, _)| self.classes.get(index).copied())
    }
}

/// The final labels for one page or image. Never empty once it leaves the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PageLabels(Vec<GraphType>);

impl PageLabels
{
    pub fn new(labels: Vec<GraphType>) -> Self
    {
        PageLabels(labels)
    }

    pub fn contains(&self, class: GraphType) -> bool
    {
        self.0.contains(&class)
    }

    pub fn as_slice(&self) -> &[GraphType]
    {
        &self.0
    }

    pub fn len(&self) -> usize
    {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.0.is_empty()
    }
}

/// Number of pages carrying each graph type. Every class is always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassCounts([usize; GraphType::COUNT]);

impl ClassCounts
{
    /// Counts, for every class, how many pages carry it.
    /// A page with several labels counts toward each of them.
    pub fn from_pages<'a, I>(pages: I) -> Self
    where
        I: IntoIterator<Item = &'a PageLabels>,
    {
        let mut counts = ClassCounts::default();
        for page in pages
        {
            for class in CLASSES
            {
                if page.contains(class) {
                    counts.0[class.index()] += 1;
                }
            }
        }
        counts
    }

    pub fn get(&self, class: GraphType) -> usize
    {
        self.0[class.index()]
    }

    /// `(class, count)` pairs in class table order.
    pub fn iter(&self) -> impl Iterator<Item = (GraphType, usize)> + '_
    {
        CLASSES.iter().map(move |class| (*class, self.get(*class)))
    }
}

impl Serialize for ClassCounts
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(GraphType::COUNT))?;
        for (class, count) in self.iter()
        {
            map.serialize_entry(class.as_str(), &count)?;
        }
        map.end()
    }
}

/// Per-document tally plus the identifier derived from the file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPrediction
{
    pub paper_id: String,
    pub counts: ClassCounts,
}

impl DocumentPrediction
{
    /// Column names of the persisted table: one per class, then the identifier.
    pub fn header() -> Vec<&'static str>
    {
        CLASSES.iter().map(|class| class.as_str()).chain(std::iter::once("paper_id")).collect()
    }

    /// Values matching [`DocumentPrediction::header`].
    pub fn record(&self) -> Vec<String>
    {
        self.counts
            .iter()
            .map(|(_, count)| count.to_string())
            .chain(std::iter::once(self.paper_id.clone()))
            .collect()
    }
}

impl Serialize for DocumentPrediction
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(GraphType::COUNT + 1))?;
        for (class, count) in self.counts.iter()
        {
            map.serialize_entry(class.as_str(), &count)?;
        }
        map.serialize_entry("paper_id", &self.paper_id)?;
        map.end()
    }
}

/// Output of a batch classification, shaped by the `pagewise` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BatchPrediction
{
    Pages(Vec<PageLabels>),
    Counts(ClassCounts),
}
