//! Built-in Inno Setup project, replaceable by a drop-in `<name.fs>.iss`.
//!
//! The project is compiled from the directory holding the image, so
//! `Source` paths are relative to it.

pub const ISS_TEMPLATE: &str = r#"[Setup]
AppId={{app_id}}
AppName={{name}}
AppVersion={{version}}
AppVerName={{name}} {{version}}
AppPublisher={{vendor}}
AppComments={{comments}}
AppCopyright={{copyright}}
VersionInfoVersion={{version_info}}
VersionInfoDescription={{description}}
DefaultDirName={{install_dir}}
DisableStartupPrompt=Yes
DisableDirPage={{disable_dir_page}}
DisableProgramGroupPage=Yes
DisableReadyPage=Yes
DisableFinishedPage=Yes
DisableWelcomePage=Yes
DefaultGroupName={{group}}
{{#if license_file}}
LicenseFile={{license_file}}
{{/if}}
MinVersion=6.1
OutputBaseFilename={{installer_name}}
Compression=lzma
SolidCompression=yes
PrivilegesRequired={{privileges}}
{{#if setup_icon}}
SetupIconFile={{setup_icon}}
UninstallDisplayIcon={{uninstall_icon}}
{{/if}}
UninstallDisplayName={{name}}
{{#if wizard_image}}
WizardSmallImageFile={{wizard_image}}
{{/if}}
{{#if arch_mode}}
ArchitecturesInstallIn64BitMode={{arch_mode}}
ArchitecturesAllowed={{arch_mode}}
{{/if}}
{{#if registry}}
ChangesAssociations=yes

[Registry]
{{#each registry}}
{{this}}
{{/each}}
{{/if}}

[Languages]
Name: "english"; MessagesFile: "compiler:Default.isl"

[Files]
Source: {{source}}; DestDir: "{app}"; Flags: ignoreversion recursesubdirs createallsubdirs

[Icons]
{{#each icons}}
{{this}}
{{/each}}

[Run]
{{#if app_cds_install}}
Filename: {{run_file}}; Parameters: "-Xappcds:generatecache"; Flags: runhidden waituntilterminated
{{/if}}
Filename: {{run_file}}; Description: {{run_description}}; Flags: nowait postinstall skipifsilent

[Code]
function returnTrue(): Boolean;
begin
  Result := True;
end;

function returnFalse(): Boolean;
begin
  Result := False;
end;
"#;
