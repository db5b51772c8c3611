//! Built-in package resources for the Linux installers.
//!
//! Each template can be replaced by a file of the same public name in the
//! drop-in resources root.

pub const CONTROL: &str = r#"Package: {{package}}
Version: {{version}}
Section: {{section}}
Maintainer: {{maintainer}}
Priority: optional
Architecture: {{arch}}
Provides: {{package}}
Installed-Size: {{installed_size}}
Description: {{summary}}
{{description}}
"#;

pub const PREINST: &str = r#"#!/bin/sh
# preinst script for {{package}}
set -e

case "$1" in
    install|upgrade)
    ;;
    abort-upgrade)
    ;;
    *)
        echo "preinst called with unknown argument \`$1'" >&2
        exit 1
    ;;
esac

exit 0
"#;

pub const POSTINST: &str = r#"#!/bin/sh
# postinst script for {{package}}
set -e

case "$1" in
    configure)
{{#if menu}}        xdg-desktop-menu install --novendor /opt/{{fs_name}}/{{launcher}}.desktop
{{/if}}{{#if app_cds_cache}}        /opt/{{fs_name}}/{{launcher}} -Xappcds:generatecache
{{/if}}{{secondary_install}}{{file_association_install}}{{#if service}}        cp /opt/{{fs_name}}/{{package}}.init /etc/init.d/{{package}}
        chmod 0755 /etc/init.d/{{package}}
{{#if run_at_startup}}        update-rc.d {{package}} defaults >/dev/null
{{/if}}{{#if start_on_install}}        /etc/init.d/{{package}} start
{{/if}}{{/if}}    ;;
    abort-upgrade|abort-remove|abort-deconfigure)
    ;;
    *)
        echo "postinst called with unknown argument \`$1'" >&2
        exit 1
    ;;
esac

exit 0
"#;

pub const PRERM: &str = r#"#!/bin/sh
# prerm script for {{package}}
set -e

case "$1" in
    remove|upgrade|deconfigure)
{{#if menu}}        xdg-desktop-menu uninstall --novendor /opt/{{fs_name}}/{{launcher}}.desktop
{{/if}}{{secondary_remove}}{{file_association_remove}}{{#if service}}{{#if stop_on_uninstall}}        if [ -x /etc/init.d/{{package}} ]; then
            /etc/init.d/{{package}} stop || true
        fi
{{/if}}{{/if}}    ;;
    failed-upgrade)
    ;;
    *)
        echo "prerm called with unknown argument \`$1'" >&2
        exit 1
    ;;
esac

exit 0
"#;

pub const POSTRM: &str = r#"#!/bin/sh
# postrm script for {{package}}
set -e

case "$1" in
    purge|remove)
{{#if service}}        rm -f /etc/init.d/{{package}}
        update-rc.d {{package}} remove >/dev/null || true
{{/if}}    ;;
    upgrade|failed-upgrade|abort-install|abort-upgrade|disappear)
    ;;
    *)
        echo "postrm called with unknown argument \`$1'" >&2
        exit 1
    ;;
esac

exit 0
"#;

pub const COPYRIGHT: &str = r#"Copyright:

    {{copyright}}

License:

    {{license_text}}
"#;

pub const DESKTOP: &str = r#"[Desktop Entry]
Name={{name}}
Comment={{comment}}
Exec=/opt/{{fs_name}}/{{launcher}}
{{#if icon}}Icon=/opt/{{fs_name}}/resources/{{launcher}}.png
{{/if}}Terminal=false
Type=Application
Categories={{category}}
{{#if mime_types}}MimeType={{mime_types}}
{{/if}}"#;

pub const INIT_SCRIPT: &str = r#"#!/bin/sh
### BEGIN INIT INFO
# Provides:          {{package}}
# Required-Start:    $remote_fs $syslog
# Required-Stop:     $remote_fs $syslog
# Default-Start:     2 3 4 5
# Default-Stop:      0 1 6
# Short-Description: {{summary}}
### END INIT INFO

DAEMON=/opt/{{fs_name}}/{{launcher}}
PIDFILE=/var/run/{{package}}.pid

case "$1" in
    start)
        start-stop-daemon --start --background --make-pidfile --pidfile $PIDFILE --exec $DAEMON
    ;;
    stop)
        start-stop-daemon --stop --pidfile $PIDFILE --retry 10
        rm -f $PIDFILE
    ;;
    restart)
        $0 stop
        $0 start
    ;;
    *)
        echo "Usage: $0 {start|stop|restart}" >&2
        exit 1
    ;;
esac

exit 0
"#;

pub const RPM_SPEC: &str = r#"Summary: {{summary}}
Name: {{package}}
Version: {{version}}
Release: 1
License: {{license_type}}
Vendor: {{vendor}}
Prefix: /opt
Provides: {{package}}
BuildArch: {{arch}}
Autoprov: 0
Autoreq: 0

%define __jar_repack %{nil}
%define _build_id_links none

%description
{{description}}

%prep

%build

%install
rm -rf %{buildroot}
mkdir -p %{buildroot}/opt
cp -r %{_sourcedir}/{{fs_name}} %{buildroot}/opt

%files
{{#if license_file}}%license /opt/{{fs_name}}/app/{{license_file}}
{{/if}}/opt/{{fs_name}}

%post
{{#if menu}}xdg-desktop-menu install --novendor /opt/{{fs_name}}/{{launcher}}.desktop
{{/if}}{{secondary_install}}{{file_association_install}}
%preun
{{#if menu}}xdg-desktop-menu uninstall --novendor /opt/{{fs_name}}/{{launcher}}.desktop
{{/if}}{{secondary_remove}}{{file_association_remove}}
%clean
"#;
