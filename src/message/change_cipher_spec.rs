use nom::bytes::complete::tag;
use nom::IResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeCipherSpec;

impl ChangeCipherSpec {
    pub fn parse(input: &[u8]) -> IResult<&[u8], ChangeCipherSpec> {
        let (input, _) = tag(&[1u8][..])(input)?;
        Ok((input, ChangeCipherSpec))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.push(1);
    }
}
