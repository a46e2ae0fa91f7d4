//! Big-endian primitive codecs for the column snapshot format.

use std::io::{self, Read, Write};

/// A value that can be decoded from a byte stream.
pub trait ReadFrom: Sized {
    /// Reads a value, failing with `UnexpectedEof` on a truncated stream.
    fn read(data: &mut impl Read) -> io::Result<Self>;
}

/// A value that can be encoded into a byte stream.
pub trait WriteTo {
    /// Writes the value.
    fn write(&self, writer: &mut impl Write) -> io::Result<()>;
}

macro_rules! impl_be_primitive {
    ($($ty:ty),*) => {
        $(
            impl ReadFrom for $ty {
                fn read(data: &mut impl Read) -> io::Result<Self> {
                    let mut buf = [0; size_of::<Self>()];
                    data.read_exact(&mut buf)?;
                    Ok(Self::from_be_bytes(buf))
                }
            }

            impl WriteTo for $ty {
                fn write(&self, writer: &mut impl Write) -> io::Result<()> {
                    writer.write_all(&self.to_be_bytes())
                }
            }
        )*
    };
}

impl_be_primitive!(u8, u16, i16, u32, i32);

impl ReadFrom for bool {
    fn read(data: &mut impl Read) -> io::Result<Self> {
        Ok(u8::read(data)? != 0)
    }
}

impl WriteTo for bool {
    fn write(&self, writer: &mut impl Write) -> io::Result<()> {
        u8::from(*self).write(writer)
    }
}
