//! Shared test code.

pub mod buffer {
    /// Big-endian byte buffer builder for constructing test fixtures.
    pub struct Buffer {
        data: Vec<u8>,
    }

    impl Buffer {
        pub fn new() -> Self {
            Buffer { data: Vec::new() }
        }

        pub fn bytes(&self) -> &[u8] {
            &self.data
        }

        pub fn into_inner(self) -> Vec<u8> {
            self.data
        }

        pub fn len(&self) -> usize {
            self.data.len()
        }

        pub fn u8(&mut self, value: u8) -> &mut Self {
            self.data.push(value);
            self
        }

        pub fn i8(&mut self, value: i8) -> &mut Self {
            self.u8(value as u8)
        }

        pub fn u16(&mut self, value: u16) -> &mut Self {
            self.data.extend_from_slice(&value.to_be_bytes());
            self
        }

        pub fn i16(&mut self, value: i16) -> &mut Self {
            self.u16(value as u16)
        }

        pub fn u32(&mut self, value: u32) -> &mut Self {
            self.data.extend_from_slice(&value.to_be_bytes());
            self
        }

        pub fn i32(&mut self, value: i32) -> &mut Self {
            self.u32(value as u32)
        }

        pub fn i64(&mut self, value: i64) -> &mut Self {
            self.data.extend_from_slice(&value.to_be_bytes());
            self
        }

        pub fn extend(&mut self, bytes: &[u8]) -> &mut Self {
            self.data.extend_from_slice(bytes);
            self
        }

        pub fn zeros(&mut self, count: usize) -> &mut Self {
            self.data.extend(std::iter::repeat(0).take(count));
            self
        }
    }

    impl Default for Buffer {
        fn default() -> Self {
            Buffer::new()
        }
    }
}
