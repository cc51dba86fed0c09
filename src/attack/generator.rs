use super::config::VectorStrategy;
use super::vector::PaddingVector;
use crate::record::Record;

/// Finite, restartable source of malformed records.
pub trait VectorGenerator: Send {
    fn strategy(&self) -> VectorStrategy;

    /// The next vector and its record, or `None` once all are produced.
    fn next_record(&mut self) -> Option<(PaddingVector, Record)>;

    /// Start over from the first vector.
    fn reset(&mut self);

    fn remaining(&self) -> usize;
}

/// Walks a fixed vector list over a private copy of the template.
#[derive(Debug, Clone)]
struct Cursor {
    template: Record,
    vectors: &'static [PaddingVector],
    position: usize,
}

impl Cursor {
    fn new(template: &Record, vectors: &'static [PaddingVector]) -> Self {
        Cursor {
            template: template.clone(),
            vectors,
            position: 0,
        }
    }

    fn next(&mut self) -> Option<(PaddingVector, Record)> {
        let vector = *self.vectors.get(self.position)?;
        self.position += 1;
        trace!("Vector {} of {}: {}", self.position, self.vectors.len(), vector);
        Some((vector, vector.apply(&self.template)))
    }

    fn remaining(&self) -> usize {
        self.vectors.len() - self.position
    }
}

/// Ciphertext layout and declared length variants.
#[derive(Debug, Clone)]
pub struct ShapeVectorGenerator {
    cursor: Cursor,
}

impl ShapeVectorGenerator {
    pub fn new(template: &Record) -> Self {
        ShapeVectorGenerator {
            cursor: Cursor::new(template, PaddingVector::RECORD_SHAPE),
        }
    }
}

impl VectorGenerator for ShapeVectorGenerator {
    fn strategy(&self) -> VectorStrategy {
        VectorStrategy::RecordShape
    }

    fn next_record(&mut self) -> Option<(PaddingVector, Record)> {
        self.cursor.next()
    }

    fn reset(&mut self) {
        self.cursor.position = 0;
    }

    fn remaining(&self) -> usize {
        self.cursor.remaining()
    }
}

impl Iterator for ShapeVectorGenerator {
    type Item = (PaddingVector, Record);

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}

/// MAC and padding variants.
#[derive(Debug, Clone)]
pub struct ContentVectorGenerator {
    cursor: Cursor,
}

impl ContentVectorGenerator {
    pub fn new(template: &Record) -> Self {
        ContentVectorGenerator {
            cursor: Cursor::new(template, PaddingVector::VECTOR_CONTENT),
        }
    }
}

impl VectorGenerator for ContentVectorGenerator {
    fn strategy(&self) -> VectorStrategy {
        VectorStrategy::VectorContent
    }

    fn next_record(&mut self) -> Option<(PaddingVector, Record)> {
        self.cursor.next()
    }

    fn reset(&mut self) {
        self.cursor.position = 0;
    }

    fn remaining(&self) -> usize {
        self.cursor.remaining()
    }
}

impl Iterator for ContentVectorGenerator {
    type Item = (PaddingVector, Record);

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}

impl VectorStrategy {
    /// Generator for this strategy over a copy of `template`.
    pub fn generator(&self, template: &Record) -> Box<dyn VectorGenerator> {
        debug!("Vector generator {} over {} byte template", self, template.cleartext.len());
        match self {
            VectorStrategy::RecordShape => Box::new(ShapeVectorGenerator::new(template)),
            VectorStrategy::VectorContent => Box::new(ContentVectorGenerator::new(template)),
        }
    }

    pub fn vectors(&self) -> &'static [PaddingVector] {
        match self {
            VectorStrategy::RecordShape => PaddingVector::RECORD_SHAPE,
            VectorStrategy::VectorContent => PaddingVector::VECTOR_CONTENT,
        }
    }
}
