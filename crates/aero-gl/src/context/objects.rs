use tracing::trace;

use crate::device::Device;
use crate::error::{GlError, Result};
use crate::objects::buffer::BufferTarget;
use crate::program::{ProgramTarget, RegisterBank};

use super::{leading, GlContext};

/// Which constant bank a parameter call writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Bank {
    Env,
    Local,
}

impl<D: Device> GlContext<D> {
    pub fn gen_buffers(&mut self, names: &[u32]) -> Result<()> {
        self.outside_begin_end("glGenBuffers")?;
        self.buffers.generate(names);
        Ok(())
    }

    pub fn bind_buffer(&mut self, target: u32, name: u32) -> Result<()> {
        let call = "glBindBuffer";
        self.outside_begin_end(call)?;
        let target = BufferTarget::from_gl(call, target)?;
        self.buffers.bind(target, name);
        Ok(())
    }

    /// Arrays sourced from a deleted buffer become uninitialized.
    pub fn delete_buffers(&mut self, names: &[u32]) -> Result<()> {
        let call = "glDeleteBuffers";
        self.outside_begin_end(call)?;
        for name in self.buffers.delete(&mut self.device, names)? {
            self.arrays.forget_buffer(name);
        }
        Ok(())
    }

    pub fn buffer_data(&mut self, target: u32, size: i64, data: Option<&[u8]>) -> Result<()> {
        let call = "glBufferData";
        self.outside_begin_end(call)?;
        let target = BufferTarget::from_gl(call, target)?;
        let size = usize::try_from(size).map_err(|_| GlError::UnsupportedValue {
            call,
            param: "size",
            value: size,
        })?;
        self.buffers.buffer_data(&mut self.device, call, target, size, data)
    }

    pub fn buffer_sub_data(&mut self, target: u32, offset: i64, data: &[u8]) -> Result<()> {
        let call = "glBufferSubData";
        self.outside_begin_end(call)?;
        let target = BufferTarget::from_gl(call, target)?;
        let offset = usize::try_from(offset).map_err(|_| GlError::UnsupportedValue {
            call,
            param: "offset",
            value: offset,
        })?;
        self.buffers
            .buffer_sub_data(&mut self.device, call, target, offset, data)
    }

    pub fn gen_programs(&mut self, names: &[u32]) -> Result<()> {
        self.outside_begin_end("glGenProgramsARB")?;
        self.programs.generate(names);
        Ok(())
    }

    pub fn bind_program(&mut self, target: u32, name: u32) -> Result<()> {
        let call = "glBindProgramARB";
        self.outside_begin_end(call)?;
        let target = ProgramTarget::from_gl(call, target)?;
        self.programs.bind(call, target, name)
    }

    pub fn delete_programs(&mut self, names: &[u32]) -> Result<()> {
        self.outside_begin_end("glDeleteProgramsARB")?;
        self.programs.delete(names);
        Ok(())
    }

    /// Stores program text for the bound program; compilation happens at
    /// draw time.
    pub fn program_string(&mut self, target: u32, format: u32, text: &str) -> Result<()> {
        let call = "glProgramStringARB";
        self.outside_begin_end(call)?;
        let target = ProgramTarget::from_gl(call, target)?;
        self.programs.program_string(call, target, format, text)
    }

    fn bank_mut(&mut self, call: &'static str, target: u32, bank: Bank) -> Result<&mut RegisterBank> {
        self.outside_begin_end(call)?;
        let target = ProgramTarget::from_gl(call, target)?;
        Ok(match bank {
            Bank::Env => self.programs.env_mut(target),
            Bank::Local => self.programs.locals_mut(target),
        })
    }

    fn set_parameters(
        &mut self,
        call: &'static str,
        target: u32,
        bank: Bank,
        index: u32,
        values: &[[f32; 4]],
    ) -> Result<()> {
        trace!(call, index, count = values.len(), "program parameters");
        self.bank_mut(call, target, bank)?.set_many(call, index, values)
    }

    pub fn program_env_parameter4f(&mut self, target: u32, index: u32, x: f32, y: f32, z: f32, w: f32) -> Result<()> {
        self.set_parameters("glProgramEnvParameter4fARB", target, Bank::Env, index, &[[x, y, z, w]])
    }

    pub fn program_env_parameter4fv(&mut self, target: u32, index: u32, values: &[f32]) -> Result<()> {
        let call = "glProgramEnvParameter4fvARB";
        let value = leading::<4>(call, "params", values)?;
        self.set_parameters(call, target, Bank::Env, index, &[value])
    }

    pub fn program_local_parameter4f(&mut self, target: u32, index: u32, x: f32, y: f32, z: f32, w: f32) -> Result<()> {
        self.set_parameters("glProgramLocalParameter4fARB", target, Bank::Local, index, &[[x, y, z, w]])
    }

    pub fn program_local_parameter4fv(&mut self, target: u32, index: u32, values: &[f32]) -> Result<()> {
        let call = "glProgramLocalParameter4fvARB";
        let value = leading::<4>(call, "params", values)?;
        self.set_parameters(call, target, Bank::Local, index, &[value])
    }

    /// Consecutive registers starting at `index`; a range past the bank is a
    /// capability error and writes nothing.
    pub fn program_env_parameters4fv(&mut self, target: u32, index: u32, values: &[[f32; 4]]) -> Result<()> {
        self.set_parameters("glProgramEnvParameters4fvEXT", target, Bank::Env, index, values)
    }

    pub fn program_local_parameters4fv(&mut self, target: u32, index: u32, values: &[[f32; 4]]) -> Result<()> {
        self.set_parameters("glProgramLocalParameters4fvEXT", target, Bank::Local, index, values)
    }
}
