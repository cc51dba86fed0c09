#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationData {
    pub data: Vec<u8>,
}

impl ApplicationData {
    pub fn new(data: &[u8]) -> Self {
        ApplicationData {
            data: data.to_vec(),
        }
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.data);
    }
}
